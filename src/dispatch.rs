//! Delivery of health reports. The core only produces reports; dispatchers decide where they go.

use crate::models::{HealthReport, Severity};
use tokio::sync::broadcast;

pub trait AlertDispatcher: Send + Sync + 'static {
    fn dispatch(&self, report: &HealthReport);
}

/// Writes each report to the log: a summary line, then one line per issue at a level
/// matching its severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl AlertDispatcher for LogDispatcher {
    fn dispatch(&self, report: &HealthReport) {
        tracing::info!(
            score = report.score,
            issues = report.issues.len(),
            tips = report.tips.len(),
            unavailable = ?report.unavailable,
            "health report"
        );
        for issue in &report.issues {
            match issue.severity {
                Severity::Critical | Severity::High => tracing::warn!(
                    issue_type = ?issue.issue_type,
                    severity = ?issue.severity,
                    context = issue.context.as_deref().unwrap_or(""),
                    "{}: {}",
                    issue.title,
                    issue.description
                ),
                Severity::Medium | Severity::Low => tracing::info!(
                    issue_type = ?issue.issue_type,
                    severity = ?issue.severity,
                    context = issue.context.as_deref().unwrap_or(""),
                    "{}: {}",
                    issue.title,
                    issue.description
                ),
            }
        }
    }
}

/// Fans reports out to any number of subscribers. Slow subscribers lag and skip reports.
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    tx: broadcast::Sender<HealthReport>,
}

impl BroadcastDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HealthReport> {
        self.tx.subscribe()
    }
}

impl AlertDispatcher for BroadcastDispatcher {
    fn dispatch(&self, report: &HealthReport) {
        if self.tx.send(report.clone()).is_err() {
            tracing::debug!(operation = "broadcast_report", "no subscribers for health report");
        }
    }
}
