// Config loading and validation tests

use devhealth::config::AppConfig;
use devhealth::error::ConfigError;

const VALID_CONFIG: &str = r#"
[monitoring]
cpu_interval_ms = 1000
memory_interval_ms = 5000
battery_interval_ms = 5000
frame_interval_ms = 1000
anr_check_interval_ms = 1000
anr_threshold_ms = 5000
history_capacity = 100
drain_window_ms = 3600000
sample_timeout_ms = 2000

[database]
path = "data/devhealth.db"
flush_rate = 10
flush_interval_secs = 5
retention_days = 30
vacuum_schedule = "0 0 3 * * *"

[alerts]
report_interval_secs = 60
unavailable_after = 3
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.monitoring.cpu_interval_ms, 1000);
    assert_eq!(config.monitoring.memory_interval_ms, 5000);
    assert_eq!(config.monitoring.history_capacity, 100);
    assert_eq!(config.database.path, "data/devhealth.db");
    assert_eq!(config.database.flush_rate, 10);
    assert_eq!(config.database.vacuum_schedule.as_deref(), Some("0 0 3 * * *"));
    assert_eq!(config.alerts.unavailable_after, 3);
}

#[test]
fn test_config_empty_file_uses_defaults() {
    let config = AppConfig::load_from_str("").expect("defaults");
    assert_eq!(config.monitoring.cpu_interval_ms, 1000);
    assert_eq!(config.monitoring.battery_interval_ms, 5000);
    assert_eq!(config.monitoring.anr_threshold_ms, 5000);
    assert_eq!(config.monitoring.sample_timeout_ms, 2000);
    assert_eq!(config.monitoring.storage_path, "/");
    assert_eq!(config.database.retention_days, 30);
    assert_eq!(config.database.prune_interval_secs, 3600);
    assert!(config.database.vacuum_schedule.is_none());
    assert_eq!(config.alerts.report_interval_secs, 60);
}

#[test]
fn test_config_partial_section_keeps_other_defaults() {
    let config = AppConfig::load_from_str("[monitoring]\ncpu_interval_ms = 250\n").unwrap();
    assert_eq!(config.monitoring.cpu_interval_ms, 250);
    assert_eq!(config.monitoring.memory_interval_ms, 5000);
    assert_eq!(config.database.flush_rate, 10);
}

#[test]
fn test_config_validation_rejects_cpu_interval_zero() {
    let bad = VALID_CONFIG.replace("cpu_interval_ms = 1000", "cpu_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("monitoring.cpu_interval_ms"));
}

#[test]
fn test_config_validation_rejects_memory_interval_zero() {
    let bad = VALID_CONFIG.replace("memory_interval_ms = 5000", "memory_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("memory_interval_ms"));
}

#[test]
fn test_config_validation_rejects_history_capacity_zero() {
    let bad = VALID_CONFIG.replace("history_capacity = 100", "history_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("history_capacity"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/devhealth.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_flush_rate_zero() {
    let bad = VALID_CONFIG.replace("flush_rate = 10", "flush_rate = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("flush_rate"));
}

#[test]
fn test_config_validation_rejects_retention_zero() {
    let bad = VALID_CONFIG.replace("retention_days = 30", "retention_days = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("retention_days"));
}

#[test]
fn test_config_validation_rejects_bad_cron() {
    let bad = VALID_CONFIG.replace("\"0 0 3 * * *\"", "\"every night\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("vacuum_schedule"));
}

#[test]
fn test_config_validation_rejects_report_interval_zero() {
    let bad = VALID_CONFIG.replace("report_interval_secs = 60", "report_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("report_interval_secs"));
}

#[test]
fn test_config_validate_returns_typed_error() {
    let mut config = AppConfig::default();
    config.monitoring.sample_timeout_ms = 0;
    assert_eq!(
        config.validate(),
        Err(ConfigError::NotPositive {
            field: "monitoring.sample_timeout_ms",
            value: 0
        })
    );
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.database.path, "data/devhealth.db");
    assert_eq!(config.alerts.report_interval_secs, 60);
}
