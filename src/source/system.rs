// Production metric source: sysinfo for memory, disks, sensors and uptime; Linux files for
// CPU ticks, battery and screen state.

use super::{CpuTicks, MemoryTotals, MetricSource, StorageTotals, linux};
use crate::error::SampleError;
use crate::models::BatteryStats;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Components, Disks, System};

pub struct SysinfoSource {
    sys: Mutex<System>,
    disks: Mutex<Disks>,
    components: Mutex<Components>,
    storage_path: PathBuf,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new("/")
    }
}

impl SysinfoSource {
    /// `storage_path` selects the filesystem reported as device storage.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self {
            sys: Mutex::new(sys),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            components: Mutex::new(Components::new_with_refreshed_list()),
            storage_path: storage_path.into(),
        }
    }
}

/// Disk whose mount point is the longest prefix of `path`.
fn disk_for_path<'a>(disks: &'a Disks, path: &Path) -> Option<&'a sysinfo::Disk> {
    disks
        .list()
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
}

impl MetricSource for SysinfoSource {
    fn read_cpu_ticks(&self) -> Result<CpuTicks, SampleError> {
        linux::read_proc_stat()
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| SampleError::unavailable("read_memory_totals", format!("lock poisoned: {e}")))?;
        sys.refresh_memory();
        let total_bytes = sys.total_memory();
        if total_bytes == 0 {
            return Err(SampleError::invalid("read_memory_totals", "total memory is 0"));
        }
        Ok(MemoryTotals {
            total_bytes,
            available_bytes: sys.available_memory(),
        })
    }

    fn read_battery_status(&self) -> Result<BatteryStats, SampleError> {
        linux::read_power_supply()
    }

    fn read_storage_totals(&self) -> Result<StorageTotals, SampleError> {
        let mut disks = self
            .disks
            .lock()
            .map_err(|e| SampleError::unavailable("read_storage_totals", format!("lock poisoned: {e}")))?;
        disks.refresh(false);
        if let Some(disk) = disk_for_path(&disks, &self.storage_path) {
            return Ok(StorageTotals {
                total_bytes: disk.total_space(),
                free_bytes: disk.available_space(),
            });
        }
        let (total_bytes, free_bytes) = disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, f), d| (t + d.total_space(), f + d.available_space()));
        if total_bytes == 0 {
            return Err(SampleError::unavailable("read_storage_totals", "no disks listed"));
        }
        Ok(StorageTotals {
            total_bytes,
            free_bytes,
        })
    }

    fn read_device_temperature(&self) -> Result<f64, SampleError> {
        if let Some(t) = linux::read_thermal_zone() {
            return Ok(t);
        }
        let mut components = self.components.lock().map_err(|e| {
            SampleError::unavailable("read_device_temperature", format!("lock poisoned: {e}"))
        })?;
        components.refresh(false);
        components
            .list()
            .iter()
            .filter_map(|c| c.temperature())
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(f64::from)
            .reduce(f64::max)
            .ok_or_else(|| SampleError::unavailable("read_device_temperature", "no thermal sensor"))
    }

    fn read_screen_on(&self) -> Result<bool, SampleError> {
        linux::read_backlight_on()
    }

    fn read_uptime_secs(&self) -> Result<u64, SampleError> {
        Ok(System::uptime())
    }
}
