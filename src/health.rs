// Composite health score: start at 100, one deduction per category (highest matching
// tier only), clamp to [0, 100].

use crate::models::Snapshot;

const MAX_SCORE: i32 = 100;

/// (threshold, deduction) tiers, highest first. A value must exceed the threshold.
const MEMORY_TIERS: [(f64, i32); 3] = [(90.0, 30), (80.0, 20), (70.0, 10)];
const STORAGE_TIERS: [(f64, i32); 3] = [(95.0, 25), (85.0, 15), (75.0, 10)];
const TEMPERATURE_TIERS: [(f64, i32); 3] = [(70.0, 20), (60.0, 15), (50.0, 10)];

fn tier_deduction(value: f64, tiers: &[(f64, i32)]) -> i32 {
    tiers
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, deduction)| *deduction)
        .unwrap_or(0)
}

pub fn memory_deduction(used_percent: f64) -> i32 {
    tier_deduction(used_percent, &MEMORY_TIERS)
}

pub fn storage_deduction(used_percent: f64) -> i32 {
    tier_deduction(used_percent, &STORAGE_TIERS)
}

pub fn temperature_deduction(celsius: f64) -> i32 {
    tier_deduction(celsius, &TEMPERATURE_TIERS)
}

/// Deterministic and side-effect free.
pub fn score(snapshot: &Snapshot) -> u8 {
    let sample = &snapshot.sample;
    let total = MAX_SCORE
        - memory_deduction(sample.memory.used_percent)
        - storage_deduction(sample.storage.used_percent)
        - temperature_deduction(sample.device_temperature_c);
    total.clamp(0, MAX_SCORE) as u8
}
