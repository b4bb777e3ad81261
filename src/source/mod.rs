// Metric source: raw OS counters, read synchronously on the blocking pool.
// Every read may fail at any call; callers fall back instead of aborting.

mod linux;
mod system;

pub use system::SysinfoSource;

use crate::error::SampleError;
use crate::models::{AppInventory, BatteryStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Aggregate CPU time counters (jiffies) since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTicks {
    /// Sum of all counters, widened so any combination of `u64` values fits.
    pub fn total(&self) -> u128 {
        [self.user, self.nice, self.system, self.idle, self.iowait, self.irq, self.softirq]
            .into_iter()
            .map(u128::from)
            .sum()
    }

    pub fn idle(&self) -> u64 {
        self.idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryTotals {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageTotals {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Pluggable provider of raw counters. Optional readers default to `Unsupported`.
pub trait MetricSource: Send + Sync + 'static {
    fn read_cpu_ticks(&self) -> Result<CpuTicks, SampleError>;
    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError>;
    fn read_battery_status(&self) -> Result<BatteryStats, SampleError>;
    fn read_storage_totals(&self) -> Result<StorageTotals, SampleError>;
    fn read_device_temperature(&self) -> Result<f64, SampleError>;

    fn read_screen_on(&self) -> Result<bool, SampleError> {
        Err(SampleError::Unsupported("read_screen_on"))
    }

    fn read_frame_rate(&self) -> Result<f64, SampleError> {
        Err(SampleError::Unsupported("read_frame_rate"))
    }

    fn read_uptime_secs(&self) -> Result<u64, SampleError> {
        Err(SampleError::Unsupported("read_uptime_secs"))
    }

    fn read_app_inventory(&self) -> Result<AppInventory, SampleError> {
        Err(SampleError::Unsupported("read_app_inventory"))
    }
}

/// Runs one source read on the blocking pool, bounded by `timeout`.
/// A timeout leaves the blocking read to finish in the background and reports `Timeout`.
pub async fn read_bounded<T, F>(
    source: &Arc<dyn MetricSource>,
    timeout: Duration,
    operation: &'static str,
    read: F,
) -> Result<T, SampleError>
where
    T: Send + 'static,
    F: FnOnce(&dyn MetricSource) -> Result<T, SampleError> + Send + 'static,
{
    let source = Arc::clone(source);
    let task = tokio::task::spawn_blocking(move || read(source.as_ref()));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SampleError::unavailable(operation, format!("task join: {e}"))),
        Err(_) => Err(SampleError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
