// Diagnostic issues, tips and the health report handed to the alert dispatcher

use serde::{Deserialize, Serialize};

use super::{BatteryLifeEstimate, DerivedStats, MetricFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueType {
    Memory,
    Storage,
    Battery,
    Temperature,
    Apps,
    Security,
    Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Value object created fresh per diagnostic pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub suggestion: String,
    /// Caller-supplied label (e.g. the screen the user was on).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub action: String,
}

/// Result of `MonitorSupervisor::health_snapshot`; computed on read, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub timestamp: u64,
    pub score: u8,
    pub issues: Vec<DiagnosticIssue>,
    pub tips: Vec<Tip>,
    pub recommendations: Vec<String>,
    pub stats: DerivedStats,
    pub battery_life: BatteryLifeEstimate,
    /// Families whose recent ticks all failed.
    pub unavailable: Vec<MetricFamily>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.score >= 80 && self.issues.is_empty()
    }

    pub fn critical_issues(&self) -> Vec<&DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .collect()
    }

    pub fn high_priority_issues(&self) -> Vec<&DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= Severity::High)
            .collect()
    }
}
