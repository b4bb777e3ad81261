// Alert rules, tips and recommendations

mod common;

use common::{battery, snapshot};
use devhealth::alerts::*;
use devhealth::models::*;

fn with_battery(b: BatteryStats) -> Snapshot {
    let mut s = snapshot(40.0, 40.0, 30.0);
    s.sample.battery = b;
    s
}

fn types(issues: &[DiagnosticIssue]) -> Vec<(IssueType, Severity)> {
    issues.iter().map(|i| (i.issue_type, i.severity)).collect()
}

#[test]
fn no_issues_for_healthy_snapshot() {
    let s = with_battery(battery(70.0, false));
    assert!(evaluate(&s, &AlertContext::default()).is_empty());
    assert!(battery_tips(&s).is_empty());
}

#[test]
fn memory_and_storage_tiers() {
    let issues = evaluate(&snapshot(85.0, 80.0, 30.0), &AlertContext::default());
    assert_eq!(
        types(&issues),
        vec![(IssueType::Memory, Severity::Medium), (IssueType::Storage, Severity::Medium)]
    );
    let issues = evaluate(&snapshot(40.0, 90.0, 55.0), &AlertContext::default());
    assert_eq!(
        types(&issues),
        vec![(IssueType::Storage, Severity::High), (IssueType::Temperature, Severity::Medium)]
    );
}

#[test]
fn hot_battery_wins_over_low_battery() {
    let mut b = battery(10.0, false);
    b.temperature_c = 47.0;
    let issues = evaluate(&with_battery(b), &AlertContext::default());
    assert_eq!(types(&issues), vec![(IssueType::Battery, Severity::High)]);
}

#[test]
fn low_battery_only_when_not_charging() {
    let issues = evaluate(&with_battery(battery(15.0, false)), &AlertContext::default());
    assert_eq!(types(&issues), vec![(IssueType::Battery, Severity::Medium)]);
    assert!(evaluate(&with_battery(battery(15.0, true)), &AlertContext::default()).is_empty());
}

#[test]
fn missing_battery_is_ignored() {
    // default battery: present = false, level 0
    let issues = evaluate(&snapshot(40.0, 40.0, 30.0), &AlertContext::default());
    assert!(issues.is_empty());
}

#[test]
fn stability_checks() {
    let mut s = snapshot(40.0, 40.0, 30.0);
    s.sample.uptime_secs = 200 * 3600;
    s.stats.anr_events = 2;
    let issues = evaluate(&s, &AlertContext::default());
    assert_eq!(
        types(&issues),
        vec![(IssueType::Stability, Severity::Medium), (IssueType::Stability, Severity::High)]
    );
}

#[test]
fn app_checks_need_inventory() {
    let s = snapshot(40.0, 40.0, 30.0);
    let ctx = AlertContext {
        tag: None,
        apps: Some(AppInventory {
            installed: 250,
            debuggable: 1,
        }),
    };
    let issues = evaluate(&s, &ctx);
    assert_eq!(
        types(&issues),
        vec![(IssueType::Apps, Severity::Medium), (IssueType::Security, Severity::Medium)]
    );
}

#[test]
fn context_tag_is_attached_to_every_issue() {
    let issues = evaluate(&snapshot(95.0, 97.0, 30.0), &AlertContext::tagged("checkout"));
    assert_eq!(issues.len(), 2);
    assert!(issues.iter().all(|i| i.context.as_deref() == Some("checkout")));
}

#[test]
fn storage_description_reports_free_space() {
    let issues = evaluate(&snapshot(40.0, 96.0, 30.0), &AlertContext::default());
    assert!(issues[0].description.contains("GB free"), "{}", issues[0].description);
}

#[test]
fn battery_tips_cover_each_rule() {
    let mut b = battery(90.0, true);
    b.temperature_c = 42.0;
    b.health = BatteryHealth::Overheat;
    let mut s = with_battery(b);
    s.stats.screen_on_ratio_percent = 80.0;
    s.stats.frame_rate = FrameRateStats {
        avg_fps: 20.0,
        min_fps: 10.0,
        max_fps: 30.0,
        samples: 5,
    };
    let tips = battery_tips(&s);
    let titles: Vec<&str> = tips.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Battery temperature high",
            "Screen on for long periods",
            "Battery health abnormal",
            "Consider unplugging",
            "Low frame rate",
        ]
    );
}

#[test]
fn recommendations_are_one_per_category() {
    let mut s = snapshot(95.0, 97.0, 75.0);
    s.sample.uptime_secs = 500 * 3600;
    s.stats.anr_events = 1;
    let recs = recommendations(&evaluate(&s, &AlertContext::default()));
    assert_eq!(recs.len(), 4);
}

#[test]
fn format_bytes_scales_units() {
    assert_eq!(format_bytes(512), "512.0 B");
    assert_eq!(format_bytes(1536), "1.5 KB");
    assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
}
