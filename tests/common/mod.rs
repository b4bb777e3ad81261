// Shared test helpers: a scripted metric source and snapshot builders

#![allow(dead_code)]

use devhealth::error::SampleError;
use devhealth::models::*;
use devhealth::source::{CpuTicks, MemoryTotals, MetricSource, StorageTotals};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Values served by [`ScriptedSource`]. `None` makes the matching read fail.
#[derive(Debug, Clone)]
pub struct Script {
    /// Added to the counters on every CPU read: (busy, idle).
    pub cpu_step: Option<(u64, u64)>,
    pub memory: Option<MemoryTotals>,
    pub storage: Option<StorageTotals>,
    pub temperature: Option<f64>,
    pub battery: Option<BatteryStats>,
    pub screen_on: Option<bool>,
    pub fps: Option<f64>,
    pub uptime_secs: Option<u64>,
    pub apps: Option<AppInventory>,
    /// Every read sleeps this long first.
    pub read_delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            cpu_step: Some((30, 70)),
            memory: Some(MemoryTotals {
                total_bytes: 8 * GIB,
                available_bytes: 4 * GIB,
            }),
            storage: Some(StorageTotals {
                total_bytes: 100 * GIB,
                free_bytes: 60 * GIB,
            }),
            temperature: Some(35.0),
            battery: Some(battery(80.0, false)),
            screen_on: Some(true),
            fps: Some(60.0),
            uptime_secs: Some(3600),
            apps: None,
            read_delay: Duration::ZERO,
        }
    }
}

pub fn battery(level_percent: f64, is_charging: bool) -> BatteryStats {
    BatteryStats {
        present: true,
        level_percent,
        temperature_c: 30.0,
        voltage_v: 4.0,
        is_charging,
        is_plugged: is_charging,
        health: BatteryHealth::Good,
    }
}

/// Scripted source. Change the script mid-test with [`ScriptedSource::update`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
    ticks: Mutex<CpuTicks>,
    pub reads: AtomicU64,
}

impl ScriptedSource {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            ticks: Mutex::new(CpuTicks::default()),
            reads: AtomicU64::new(0),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    fn current(&self) -> Script {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let script = self.script.lock().unwrap().clone();
        if !script.read_delay.is_zero() {
            std::thread::sleep(script.read_delay);
        }
        script
    }
}

fn missing(operation: &'static str) -> SampleError {
    SampleError::unavailable(operation, "scripted failure")
}

impl MetricSource for ScriptedSource {
    fn read_cpu_ticks(&self) -> Result<CpuTicks, SampleError> {
        let (busy, idle) = self.current().cpu_step.ok_or_else(|| missing("read_cpu_ticks"))?;
        let mut ticks = self.ticks.lock().unwrap();
        ticks.user += busy;
        ticks.idle += idle;
        Ok(*ticks)
    }

    fn read_memory_totals(&self) -> Result<MemoryTotals, SampleError> {
        self.current().memory.ok_or_else(|| missing("read_memory_totals"))
    }

    fn read_battery_status(&self) -> Result<BatteryStats, SampleError> {
        self.current().battery.ok_or_else(|| missing("read_battery_status"))
    }

    fn read_storage_totals(&self) -> Result<StorageTotals, SampleError> {
        self.current().storage.ok_or_else(|| missing("read_storage_totals"))
    }

    fn read_device_temperature(&self) -> Result<f64, SampleError> {
        self.current().temperature.ok_or_else(|| missing("read_device_temperature"))
    }

    fn read_screen_on(&self) -> Result<bool, SampleError> {
        self.current().screen_on.ok_or_else(|| missing("read_screen_on"))
    }

    fn read_frame_rate(&self) -> Result<f64, SampleError> {
        self.current().fps.ok_or(SampleError::Unsupported("read_frame_rate"))
    }

    fn read_uptime_secs(&self) -> Result<u64, SampleError> {
        self.current().uptime_secs.ok_or_else(|| missing("read_uptime_secs"))
    }

    fn read_app_inventory(&self) -> Result<AppInventory, SampleError> {
        self.current().apps.ok_or(SampleError::Unsupported("read_app_inventory"))
    }
}

/// Snapshot with the given memory %, storage % and device temperature; everything else zero.
pub fn snapshot(memory_percent: f64, storage_percent: f64, temperature_c: f64) -> Snapshot {
    Snapshot {
        sample: Sample {
            timestamp: 1_000,
            memory: MemoryStats {
                total_bytes: 100,
                used_bytes: memory_percent as u64,
                available_bytes: 100u64.saturating_sub(memory_percent as u64),
                used_percent: memory_percent,
            },
            storage: StorageStats {
                total_bytes: 100 * GIB,
                used_bytes: (storage_percent * GIB as f64) as u64,
                used_percent: storage_percent,
            },
            device_temperature_c: temperature_c,
            ..Sample::default()
        },
        stats: DerivedStats::default(),
    }
}

pub fn battery_reading(timestamp: u64, level_percent: f64, screen_on: bool) -> BatteryReading {
    BatteryReading {
        timestamp,
        battery: battery(level_percent, false),
        screen_on,
    }
}

pub fn cpu_reading(timestamp: u64, cpu_percent: f64) -> CpuReading {
    CpuReading {
        timestamp,
        cpu_percent,
    }
}

/// Polls `cond` every 10 ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
