// Model serialization tests (JSON camelCase, Record envelope, wincode payloads)

use devhealth::models::*;

#[test]
fn test_sample_serialization_camel_case() {
    let sample = Sample {
        timestamp: 42,
        cpu_percent: 12.5,
        device_temperature_c: 40.0,
        ..Sample::default()
    };
    let json = serde_json::to_string(&sample).unwrap();
    assert!(json.contains("\"cpuPercent\""));
    assert!(json.contains("\"deviceTemperatureC\""));
    assert!(json.contains("\"uptimeSecs\""));
    let back: Sample = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sample);
}

#[test]
fn test_record_is_tagged_by_stream() {
    let record = Record::FrameRate(FrameReading {
        timestamp: 5,
        fps: 59.0,
    });
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["stream"], "frameRate");
    assert_eq!(json["reading"]["fps"], 59.0);
    assert_eq!(record.family(), MetricFamily::FrameRate);
    assert_eq!(record.timestamp(), 5);
    assert_eq!(record.screen_on(), None);
}

#[test]
fn test_battery_reading_wincode_roundtrip() {
    let reading = BatteryReading {
        timestamp: 1_700_000_000_000,
        battery: BatteryStats {
            present: true,
            level_percent: 64.0,
            temperature_c: 31.5,
            voltage_v: 3.9,
            is_charging: true,
            is_plugged: true,
            health: BatteryHealth::Overheat,
        },
        screen_on: true,
    };
    let bytes = wincode::serialize(&reading).unwrap();
    let back: BatteryReading = wincode::deserialize(&bytes).unwrap();
    assert_eq!(back, reading);
}

#[test]
fn test_battery_health_parses_power_supply_strings() {
    assert_eq!(BatteryHealth::from_power_supply("Good"), BatteryHealth::Good);
    assert_eq!(BatteryHealth::from_power_supply("Overheat\n"), BatteryHealth::Overheat);
    assert_eq!(BatteryHealth::from_power_supply("something new"), BatteryHealth::Unknown);
    let unknown: BatteryHealth = serde_json::from_str("\"unspecified\"").unwrap();
    assert_eq!(unknown, BatteryHealth::Unknown);
}

#[test]
fn test_memory_and_storage_percentages() {
    let mem = MemoryStats::from_totals(8_000, 2_000);
    assert_eq!(mem.used_bytes, 6_000);
    assert_eq!(mem.used_percent, 75.0);

    let empty = MemoryStats::from_totals(0, 0);
    assert_eq!(empty.used_percent, 0.0);

    let storage = StorageStats::from_totals(1_000, 250);
    assert_eq!(storage.used_percent, 75.0);
    assert_eq!(storage.free_bytes(), 250);
}

#[test]
fn test_reading_fallback_values() {
    let cpu = CpuReading {
        timestamp: 1,
        cpu_percent: 55.0,
    };
    assert_eq!(cpu.restamp(9).timestamp, 9);
    assert_eq!(cpu.restamp(9).cpu_percent, 55.0);
    assert_eq!(CpuReading::zero(3).cpu_percent, 0.0);

    let anr = AnrReading {
        timestamp: 1,
        block_ms: 5_000,
        blocked: true,
    };
    assert!(!anr.restamp(2).blocked);
}

#[test]
fn test_metric_family_tags() {
    for family in MetricFamily::ALL {
        assert_eq!(MetricFamily::from_tag(family.as_str()), Some(family));
    }
    assert_eq!(MetricFamily::from_tag("gpu"), None);
    assert_eq!(MetricFamily::FrameRate.to_string(), "frame_rate");
}

#[test]
fn test_health_report_helpers() {
    let issue = |severity| DiagnosticIssue {
        issue_type: IssueType::Memory,
        severity,
        title: String::new(),
        description: String::new(),
        suggestion: String::new(),
        context: None,
    };
    let report = HealthReport {
        timestamp: 0,
        score: 90,
        issues: vec![issue(Severity::Critical), issue(Severity::High), issue(Severity::Low)],
        tips: vec![],
        recommendations: vec![],
        stats: DerivedStats::default(),
        battery_life: BatteryLifeEstimate {
            remaining_hours: 0.0,
            remaining_minutes: 0,
            status: BatteryLifeStatus::InsufficientData,
        },
        unavailable: vec![],
    };
    assert!(!report.is_healthy());
    assert_eq!(report.critical_issues().len(), 1);
    assert_eq!(report.high_priority_issues().len(), 2);

    let json = serde_json::to_string(&report.issues[0]).unwrap();
    assert!(json.contains("\"type\":\"memory\""));
    assert!(!json.contains("context"));
}
