use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitoring: MonitorConfig,
    pub database: DatabaseConfig,
    pub alerts: AlertConfig,
}

/// Sampler timing and history sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub cpu_interval_ms: u64,
    /// Memory, storage, device temperature and uptime.
    pub memory_interval_ms: u64,
    pub battery_interval_ms: u64,
    pub frame_interval_ms: u64,
    pub anr_check_interval_ms: u64,
    /// A ping unanswered for this long counts as an ANR.
    pub anr_threshold_ms: u64,
    /// Entries kept per metric stream.
    pub history_capacity: usize,
    /// Window for drain rate and the averages in a health report.
    pub drain_window_ms: u64,
    /// Upper bound on a single source read.
    pub sample_timeout_ms: u64,
    /// Filesystem reported as device storage.
    pub storage_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_interval_ms: 1000,
            memory_interval_ms: 5000,
            battery_interval_ms: 5000,
            frame_interval_ms: 1000,
            anr_check_interval_ms: 1000,
            anr_threshold_ms: 5000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            drain_window_ms: 3_600_000,
            sample_timeout_ms: 2000,
            storage_path: "/".into(),
        }
    }
}

impl MonitorConfig {
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("monitoring.cpu_interval_ms", self.cpu_interval_ms)?;
        positive("monitoring.memory_interval_ms", self.memory_interval_ms)?;
        positive("monitoring.battery_interval_ms", self.battery_interval_ms)?;
        positive("monitoring.frame_interval_ms", self.frame_interval_ms)?;
        positive("monitoring.anr_check_interval_ms", self.anr_check_interval_ms)?;
        positive("monitoring.anr_threshold_ms", self.anr_threshold_ms)?;
        positive("monitoring.history_capacity", self.history_capacity as u64)?;
        positive("monitoring.drain_window_ms", self.drain_window_ms)?;
        positive("monitoring.sample_timeout_ms", self.sample_timeout_ms)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    /// Records per batch written by the history writer.
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
    pub retention_days: u32,
    pub prune_interval_secs: u64,
    /// Cron expression for compaction (e.g. "0 0 3 * * *"), local time. Overrides
    /// `vacuum_interval_secs` when set.
    pub vacuum_schedule: Option<String>,
    pub vacuum_interval_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/devhealth.db".into(),
            flush_rate: 10,
            flush_interval_secs: 5,
            retention_days: 30,
            prune_interval_secs: 3600,
            vacuum_schedule: None,
            vacuum_interval_secs: 86_400,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.path",
                reason: "must be non-empty".into(),
            });
        }
        positive("database.flush_rate", self.flush_rate)?;
        positive("database.flush_interval_secs", self.flush_interval_secs)?;
        positive("database.retention_days", self.retention_days as u64)?;
        positive("database.prune_interval_secs", self.prune_interval_secs)?;
        positive("database.vacuum_interval_secs", self.vacuum_interval_secs)?;
        if let Some(expr) = &self.vacuum_schedule {
            cron::Schedule::from_str(expr).map_err(|e| ConfigError::Invalid {
                field: "database.vacuum_schedule",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// How often the supervisor builds a health report and dispatches it.
    pub report_interval_secs: u64,
    /// Failed ticks in a row before a family is reported as unavailable.
    pub unavailable_after: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
            unavailable_after: 3,
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("alerts.report_interval_secs", self.report_interval_secs)?;
        positive("alerts.unavailable_after", self.unavailable_after as u64)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitoring.validate()?;
        self.database.validate()?;
        self.alerts.validate()?;
        Ok(())
    }
}
