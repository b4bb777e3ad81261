// Derived statistics and the Sample + stats pair that health scoring consumes

use serde::{Deserialize, Serialize};

use super::Sample;

/// Reductions over a history window. Recomputed on demand, never mutated in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub avg_cpu: f64,
    pub avg_memory_percent: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    /// Percent per hour; negative while charging.
    pub drain_rate_percent_per_hour: f64,
    pub screen_on_ratio_percent: f64,
    pub frame_rate: FrameRateStats,
    /// Watchdog checks in the window that found the runtime blocked.
    pub anr_events: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRateStats {
    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub samples: u32,
}

/// A Sample plus the DerivedStats computed from recent history at the same moment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sample: Sample,
    pub stats: DerivedStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatteryLifeStatus {
    Plenty,
    Good,
    Fair,
    Low,
    Critical,
    /// Level rising over the drain window; no remaining-time estimate.
    Charging,
    /// Fewer than two battery readings in the drain window.
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryLifeEstimate {
    pub remaining_hours: f64,
    pub remaining_minutes: u64,
    pub status: BatteryLifeStatus,
}
