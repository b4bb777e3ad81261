// Error taxonomy: sample failures are recovered by the sampler, persistence failures are
// logged and swallowed, config failures reject startup.

use thiserror::Error;

/// A single failed read against the metric source. Never fatal to a sampling loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SampleError {
    /// Counter exists on this platform but could not be read right now (missing file, permission).
    #[error("{operation} unavailable: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
    /// Counter is not provided by this source at all.
    #[error("{0} unsupported by this metric source")]
    Unsupported(&'static str),
    /// Source returned a value that cannot be interpreted (sentinel, parse failure).
    #[error("{operation} returned invalid data: {reason}")]
    Invalid {
        operation: &'static str,
        reason: String,
    },
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl SampleError {
    pub fn unavailable(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        SampleError::Unavailable {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn invalid(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        SampleError::Invalid {
            operation,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("encode {stream}: {reason}")]
    Encode { stream: &'static str, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Invalid configuration; reported once by `MonitorSupervisor::start_all`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: u64 },
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("monitor already running")]
    AlreadyRunning,
    #[error("monitor not running")]
    NotRunning,
}
