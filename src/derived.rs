// Derived metrics: pure reductions over history windows.
// Every function returns a zero result for an empty window instead of failing.

use serde::{Deserialize, Serialize};

use crate::models::{
    AnrReading, BatteryLifeEstimate, BatteryLifeStatus, BatteryReading, CpuReading, DerivedStats,
    FrameRateStats, FrameReading, ResourceReading,
};

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0u32), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

pub fn average_cpu(window: &[CpuReading]) -> f64 {
    mean(window.iter().map(|r| r.cpu_percent))
}

/// Zero-value fallbacks carry no memory total; a successful read always does.
fn measured(window: &[ResourceReading]) -> impl Iterator<Item = &ResourceReading> + Clone {
    window.iter().filter(|r| r.memory.total_bytes > 0)
}

pub fn average_memory_percent(window: &[ResourceReading]) -> f64 {
    mean(measured(window).map(|r| r.memory.used_percent))
}

/// Device temperature range over measured readings; all zero when there are none.
pub fn min_max_avg_temperature(window: &[ResourceReading]) -> TemperatureRange {
    let temps = measured(window).map(|r| r.device_temperature_c);
    if temps.clone().next().is_none() {
        return TemperatureRange::default();
    }
    TemperatureRange {
        min: temps.clone().fold(f64::INFINITY, f64::min),
        max: temps.clone().fold(f64::NEG_INFINITY, f64::max),
        avg: mean(temps),
    }
}

/// Battery readings that describe a present battery. Zero-value fallbacks report none.
pub fn battery_readings_present(window: &[BatteryReading]) -> usize {
    window.iter().filter(|r| r.battery.present).count()
}

/// Percent of battery lost per hour between the earliest and latest present-battery reading.
/// Negative while charging; 0 when the window spans no time.
pub fn battery_drain_rate(window: &[BatteryReading]) -> f64 {
    let present = window.iter().filter(|r| r.battery.present);
    let (Some(earliest), Some(latest)) = (
        present.clone().min_by_key(|r| r.timestamp),
        present.max_by_key(|r| r.timestamp),
    ) else {
        return 0.0;
    };
    let elapsed_hours = (latest.timestamp - earliest.timestamp) as f64 / MS_PER_HOUR;
    let level_drop = earliest.battery.level_percent - latest.battery.level_percent;
    if elapsed_hours > 0.0 {
        level_drop / elapsed_hours
    } else {
        0.0
    }
}

pub fn screen_on_ratio(on_time_ms: u64, off_time_ms: u64) -> f64 {
    let total = on_time_ms + off_time_ms;
    if total == 0 {
        0.0
    } else {
        on_time_ms as f64 / total as f64 * 100.0
    }
}

pub fn frame_rate_stats(window: &[FrameReading]) -> FrameRateStats {
    if window.is_empty() {
        return FrameRateStats::default();
    }
    let fps = window.iter().map(|r| r.fps);
    FrameRateStats {
        avg_fps: mean(fps.clone()),
        min_fps: fps.clone().fold(f64::INFINITY, f64::min),
        max_fps: fps.fold(f64::NEG_INFINITY, f64::max),
        samples: window.len() as u32,
    }
}

pub fn anr_event_count(window: &[AnrReading]) -> u32 {
    window.iter().filter(|r| r.blocked).count() as u32
}

/// Remaining battery time at the current drain rate. Needs two present-battery readings in
/// the window. A negative rate reports `Charging`; a zero rate (level flat) reports 0 hours
/// at `Critical`, the same as an empty battery.
pub fn estimate_battery_life(
    level_percent: f64,
    drain_rate_percent_per_hour: f64,
    readings_in_window: usize,
) -> BatteryLifeEstimate {
    if readings_in_window < 2 {
        return BatteryLifeEstimate {
            remaining_hours: 0.0,
            remaining_minutes: 0,
            status: BatteryLifeStatus::InsufficientData,
        };
    }
    if drain_rate_percent_per_hour < 0.0 {
        return BatteryLifeEstimate {
            remaining_hours: 0.0,
            remaining_minutes: 0,
            status: BatteryLifeStatus::Charging,
        };
    }
    let remaining_hours = if drain_rate_percent_per_hour > 0.0 {
        level_percent.max(0.0) / drain_rate_percent_per_hour
    } else {
        0.0
    };
    let status = if remaining_hours > 8.0 {
        BatteryLifeStatus::Plenty
    } else if remaining_hours > 4.0 {
        BatteryLifeStatus::Good
    } else if remaining_hours > 2.0 {
        BatteryLifeStatus::Fair
    } else if remaining_hours > 1.0 {
        BatteryLifeStatus::Low
    } else {
        BatteryLifeStatus::Critical
    };
    BatteryLifeEstimate {
        remaining_hours,
        remaining_minutes: (remaining_hours * 60.0).round() as u64,
        status,
    }
}

/// Windows of each stream plus the screen-time buckets, as of one moment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsInputs<'a> {
    pub cpu: &'a [CpuReading],
    pub resources: &'a [ResourceReading],
    pub battery: &'a [BatteryReading],
    pub frames: &'a [FrameReading],
    pub anr: &'a [AnrReading],
    pub screen_on_ms: u64,
    pub screen_off_ms: u64,
}

pub fn derive_stats(inputs: &StatsInputs<'_>) -> DerivedStats {
    let temps = min_max_avg_temperature(inputs.resources);
    DerivedStats {
        avg_cpu: average_cpu(inputs.cpu),
        avg_memory_percent: average_memory_percent(inputs.resources),
        min_temp: temps.min,
        max_temp: temps.max,
        avg_temp: temps.avg,
        drain_rate_percent_per_hour: battery_drain_rate(inputs.battery),
        screen_on_ratio_percent: screen_on_ratio(inputs.screen_on_ms, inputs.screen_off_ms),
        frame_rate: frame_rate_stats(inputs.frames),
        anr_events: anr_event_count(inputs.anr),
    }
}

/// Screen-on/off time buckets, advanced once per battery tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenTime {
    pub on_ms: u64,
    pub off_ms: u64,
    last_tick_ms: Option<u64>,
}

impl ScreenTime {
    /// Adds the time since the previous tick to the bucket for `screen_on`.
    /// The first tick only records the timestamp; a clock step backwards adds nothing.
    pub fn record(&mut self, now_ms: u64, screen_on: bool) {
        if let Some(last) = self.last_tick_ms {
            let elapsed = now_ms.saturating_sub(last);
            if screen_on {
                self.on_ms += elapsed;
            } else {
                self.off_ms += elapsed;
            }
        }
        self.last_tick_ms = Some(now_ms);
    }

    pub fn ratio_percent(&self) -> f64 {
        screen_on_ratio(self.on_ms, self.off_ms)
    }
}
