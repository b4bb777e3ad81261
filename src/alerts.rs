//! Threshold alerts and tips.
//!
//! Stateless: every call re-evaluates its inputs and returns fresh values. Deduplication and
//! rate limiting belong to the dispatcher. Issues are additive, one per breached category.

use crate::models::{AppInventory, BatteryHealth, DiagnosticIssue, IssueType, Severity, Snapshot, Tip};

const UPTIME_RESTART_HOURS: u64 = 168;
const APP_COUNT_LIMIT: u32 = 200;
const LOW_FPS_THRESHOLD: f64 = 30.0;

/// Caller-supplied context for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertContext {
    /// Attached to every issue, e.g. the name of the screen in the foreground.
    pub tag: Option<String>,
    /// App and security checks only run when an inventory is available.
    pub apps: Option<AppInventory>,
}

impl AlertContext {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            apps: None,
        }
    }
}

fn issue(
    issue_type: IssueType,
    severity: Severity,
    title: &str,
    description: String,
    suggestion: &str,
) -> DiagnosticIssue {
    DiagnosticIssue {
        issue_type,
        severity,
        title: title.to_string(),
        description,
        suggestion: suggestion.to_string(),
        context: None,
    }
}

pub fn evaluate(snapshot: &Snapshot, ctx: &AlertContext) -> Vec<DiagnosticIssue> {
    let sample = &snapshot.sample;
    let mut issues = Vec::new();

    let mem = sample.memory.used_percent;
    if mem > 90.0 {
        issues.push(issue(
            IssueType::Memory,
            Severity::High,
            "Memory usage very high",
            format!("Memory usage is {mem:.0}%, the system may stutter"),
            "Free memory now by closing background apps",
        ));
    } else if mem > 80.0 {
        issues.push(issue(
            IssueType::Memory,
            Severity::Medium,
            "Memory usage high",
            format!("Memory usage is {mem:.0}%"),
            "Close unused apps to improve performance",
        ));
    }

    let storage = sample.storage.used_percent;
    let free = format_bytes(sample.storage.free_bytes());
    let storage_tier = if storage > 95.0 {
        Some((Severity::Critical, "Storage almost full", "Free up storage immediately"))
    } else if storage > 85.0 {
        Some((Severity::High, "Storage low", "Clean up storage space"))
    } else if storage > 75.0 {
        Some((Severity::Medium, "Storage getting tight", "Remove files you no longer need"))
    } else {
        None
    };
    if let Some((severity, title, suggestion)) = storage_tier {
        issues.push(issue(
            IssueType::Storage,
            severity,
            title,
            format!("Storage usage is {storage:.0}%, {free} free"),
            suggestion,
        ));
    }

    let temp = sample.device_temperature_c;
    let temp_tier = if temp > 70.0 {
        Some((Severity::Critical, "Device overheating", "Stop heavy tasks and let the device cool down"))
    } else if temp > 60.0 {
        Some((Severity::High, "Device running hot", "Reduce CPU load"))
    } else if temp > 50.0 {
        Some((Severity::Medium, "Device temperature elevated", "Keep an eye on the device temperature"))
    } else {
        None
    };
    if let Some((severity, title, suggestion)) = temp_tier {
        issues.push(issue(
            IssueType::Temperature,
            severity,
            title,
            format!("Device temperature is {temp:.1}°C"),
            suggestion,
        ));
    }

    let battery = &sample.battery;
    if battery.present {
        if battery.temperature_c > 45.0 {
            issues.push(issue(
                IssueType::Battery,
                Severity::High,
                "Battery temperature high",
                format!("Battery temperature is {:.1}°C", battery.temperature_c),
                "Stop charging and let the device cool down",
            ));
        } else if battery.level_percent < 20.0 && !battery.is_charging {
            issues.push(issue(
                IssueType::Battery,
                Severity::Medium,
                "Battery low",
                format!("Battery level is {:.0}%", battery.level_percent),
                "Charge the device or enable power saving",
            ));
        }
    }

    let uptime_hours = sample.uptime_secs / 3600;
    if uptime_hours > UPTIME_RESTART_HOURS {
        issues.push(issue(
            IssueType::Stability,
            Severity::Medium,
            "Long uptime",
            format!("The system has been running for {uptime_hours} hours"),
            "Restart the device to improve stability",
        ));
    }
    if snapshot.stats.anr_events > 0 {
        issues.push(issue(
            IssueType::Stability,
            Severity::High,
            "App not responding",
            format!(
                "The monitored runtime was blocked {} time(s) recently",
                snapshot.stats.anr_events
            ),
            "Look for long-running work on the main loop",
        ));
    }

    if let Some(apps) = ctx.apps {
        if apps.installed > APP_COUNT_LIMIT {
            issues.push(issue(
                IssueType::Apps,
                Severity::Medium,
                "Too many apps installed",
                format!("{} apps are installed, which may affect performance", apps.installed),
                "Uninstall apps you do not use",
            ));
        }
        if apps.debuggable > 0 {
            issues.push(issue(
                IssueType::Security,
                Severity::Medium,
                "Debuggable apps found",
                format!("{} app(s) are running in debug mode", apps.debuggable),
                "Check where these apps came from",
            ));
        }
    }

    if let Some(tag) = &ctx.tag {
        for i in &mut issues {
            i.context = Some(tag.clone());
        }
    }
    issues
}

/// Battery and usage tips derived from the same snapshot.
pub fn battery_tips(snapshot: &Snapshot) -> Vec<Tip> {
    let battery = &snapshot.sample.battery;
    let stats = &snapshot.stats;
    let mut tips = Vec::new();

    if battery.present && battery.temperature_c > 40.0 {
        tips.push(Tip {
            title: "Battery temperature high".into(),
            description: format!(
                "Battery is at {:.1}°C, reduce the device load",
                battery.temperature_c
            ),
            severity: Severity::High,
            action: "Close background apps and stop unneeded services".into(),
        });
    }
    if stats.screen_on_ratio_percent > 70.0 {
        tips.push(Tip {
            title: "Screen on for long periods".into(),
            description: format!(
                "The screen was on {:.0}% of the time",
                stats.screen_on_ratio_percent
            ),
            severity: Severity::Medium,
            action: "Lower brightness and shorten the auto-lock timeout".into(),
        });
    }
    if battery.present
        && !matches!(
            battery.health,
            BatteryHealth::Good | BatteryHealth::Unknown
        )
    {
        tips.push(Tip {
            title: "Battery health abnormal".into(),
            description: format!("Battery reports: {}", battery.health.label()),
            severity: Severity::High,
            action: "Have the battery checked".into(),
        });
    }
    if battery.present && battery.is_charging && battery.level_percent > 80.0 {
        tips.push(Tip {
            title: "Consider unplugging".into(),
            description: "Battery is above 80%, long charging shortens battery life".into(),
            severity: Severity::Low,
            action: "Unplug the charger once above 80%".into(),
        });
    }
    if stats.frame_rate.samples > 0 && stats.frame_rate.avg_fps < LOW_FPS_THRESHOLD {
        tips.push(Tip {
            title: "Low frame rate".into(),
            description: format!("Average frame rate is {:.0} fps", stats.frame_rate.avg_fps),
            severity: Severity::Medium,
            action: "Close heavy apps or lower graphics settings".into(),
        });
    }
    tips
}

/// One recommendation per issue category present, in first-seen order.
pub fn recommendations(issues: &[DiagnosticIssue]) -> Vec<String> {
    let mut seen: Vec<IssueType> = Vec::new();
    let mut out = Vec::new();
    for i in issues {
        if seen.contains(&i.issue_type) {
            continue;
        }
        seen.push(i.issue_type);
        let text = match i.issue_type {
            IssueType::Memory => "Free memory by closing unneeded background apps",
            IssueType::Storage => "Free storage by deleting files you no longer need",
            IssueType::Battery => "Optimize battery usage and enable power saving",
            IssueType::Temperature => "Reduce CPU load and turn off high-performance modes",
            IssueType::Apps | IssueType::Security => "Remove or review rarely used apps",
            IssueType::Stability => "Restart the device or run a system cleanup",
        };
        if !out.iter().any(|r| r == text) {
            out.push(text.to_string());
        }
    }
    out
}

/// Human-readable byte count, e.g. "1.5 GB".
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
