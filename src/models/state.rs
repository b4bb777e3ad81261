// Metric families and per-sampler monitor state

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricFamily {
    Cpu,
    Resources,
    Battery,
    FrameRate,
    Anr,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 5] = [
        MetricFamily::Cpu,
        MetricFamily::Resources,
        MetricFamily::Battery,
        MetricFamily::FrameRate,
        MetricFamily::Anr,
    ];

    /// Stream tag used by the persistence sink.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Cpu => "cpu",
            MetricFamily::Resources => "resources",
            MetricFamily::Battery => "battery",
            MetricFamily::FrameRate => "frame_rate",
            MetricFamily::Anr => "anr",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle and error bookkeeping for one sampler. Written only by the supervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    pub is_running: bool,
    pub last_sample_time: Option<u64>,
    pub last_error: Option<String>,
    /// Ticks in a row that ended in a fallback value.
    pub consecutive_failures: u32,
    pub samples_total: u64,
    pub failures_total: u64,
}

impl MonitorState {
    /// True when the last `threshold` ticks all failed ("data unavailable").
    pub fn is_unavailable(&self, threshold: u32) -> bool {
        threshold > 0 && self.consecutive_failures >= threshold
    }
}
