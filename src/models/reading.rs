// Per-family readings produced by the samplers, and the Record envelope handed to the sink

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

use super::{BatteryStats, MemoryStats, MetricFamily, StorageStats};

/// A sampler output. `zero` is the documented fallback for a family whose very first
/// read failed; `restamp` re-dates a last-known-good value substituted after a failure.
pub trait Reading: Clone + Send + Sync + 'static {
    const FAMILY: MetricFamily;

    fn timestamp(&self) -> u64;
    fn zero(timestamp: u64) -> Self;
    fn restamp(&self, timestamp: u64) -> Self;
    fn into_record(self) -> Record;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct CpuReading {
    pub timestamp: u64,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReading {
    pub timestamp: u64,
    pub memory: MemoryStats,
    pub storage: StorageStats,
    pub device_temperature_c: f64,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct BatteryReading {
    pub timestamp: u64,
    pub battery: BatteryStats,
    pub screen_on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct FrameReading {
    pub timestamp: u64,
    pub fps: f64,
}

/// Watchdog check result. `blocked` means the monitored runtime did not answer a ping
/// within the ANR threshold; `block_ms` is the observed (or capped) response time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct AnrReading {
    pub timestamp: u64,
    pub block_ms: u64,
    pub blocked: bool,
}

impl Reading for CpuReading {
    const FAMILY: MetricFamily = MetricFamily::Cpu;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn zero(timestamp: u64) -> Self {
        Self {
            timestamp,
            cpu_percent: 0.0,
        }
    }

    fn restamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    fn into_record(self) -> Record {
        Record::Cpu(self)
    }
}

impl Reading for ResourceReading {
    const FAMILY: MetricFamily = MetricFamily::Resources;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn zero(timestamp: u64) -> Self {
        Self {
            timestamp,
            memory: MemoryStats::default(),
            storage: StorageStats::default(),
            device_temperature_c: 0.0,
            uptime_secs: 0,
        }
    }

    fn restamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    fn into_record(self) -> Record {
        Record::Resources(self)
    }
}

impl Reading for BatteryReading {
    const FAMILY: MetricFamily = MetricFamily::Battery;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn zero(timestamp: u64) -> Self {
        Self {
            timestamp,
            battery: BatteryStats::default(),
            screen_on: false,
        }
    }

    fn restamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    fn into_record(self) -> Record {
        Record::Battery(self)
    }
}

impl Reading for FrameReading {
    const FAMILY: MetricFamily = MetricFamily::FrameRate;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn zero(timestamp: u64) -> Self {
        Self { timestamp, fps: 0.0 }
    }

    fn restamp(&self, timestamp: u64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    fn into_record(self) -> Record {
        Record::FrameRate(self)
    }
}

impl Reading for AnrReading {
    const FAMILY: MetricFamily = MetricFamily::Anr;

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn zero(timestamp: u64) -> Self {
        Self {
            timestamp,
            block_ms: 0,
            blocked: false,
        }
    }

    // A watchdog fallback must not repeat a past ANR.
    fn restamp(&self, timestamp: u64) -> Self {
        Self::zero(timestamp)
    }

    fn into_record(self) -> Record {
        Record::Anr(self)
    }
}

/// Persisted unit: one reading tagged with its stream (family).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stream", content = "reading", rename_all = "camelCase")]
pub enum Record {
    Cpu(CpuReading),
    Resources(ResourceReading),
    Battery(BatteryReading),
    FrameRate(FrameReading),
    Anr(AnrReading),
}

impl Record {
    pub fn family(&self) -> MetricFamily {
        match self {
            Record::Cpu(_) => MetricFamily::Cpu,
            Record::Resources(_) => MetricFamily::Resources,
            Record::Battery(_) => MetricFamily::Battery,
            Record::FrameRate(_) => MetricFamily::FrameRate,
            Record::Anr(_) => MetricFamily::Anr,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Record::Cpu(r) => r.timestamp,
            Record::Resources(r) => r.timestamp,
            Record::Battery(r) => r.timestamp,
            Record::FrameRate(r) => r.timestamp,
            Record::Anr(r) => r.timestamp,
        }
    }

    /// Screen state, carried only by battery records.
    pub fn screen_on(&self) -> Option<bool> {
        match self {
            Record::Battery(r) => Some(r.screen_on),
            _ => None,
        }
    }
}
