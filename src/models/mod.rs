// Domain models: per-family readings, composed samples, derived stats and diagnostics

mod diagnostic;
mod reading;
mod sample;
mod state;
mod stats;

pub use diagnostic::{DiagnosticIssue, HealthReport, IssueType, Severity, Tip};
pub use reading::{
    AnrReading, BatteryReading, CpuReading, FrameReading, Reading, Record, ResourceReading,
};
pub use sample::{AppInventory, BatteryHealth, BatteryStats, MemoryStats, Sample, StorageStats};
pub use state::{MetricFamily, MonitorState};
pub use stats::{BatteryLifeEstimate, BatteryLifeStatus, DerivedStats, FrameRateStats, Snapshot};

/// Wall-clock milliseconds since the Unix epoch; 0 if the clock is before the epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub(crate) fn percent_of(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
