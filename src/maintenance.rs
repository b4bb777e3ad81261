// Background maintenance: prune records past retention every prune_interval_secs; compact on a
// configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::PersistenceError;
use crate::models::now_ms;
use crate::sink::PersistenceSink;
use tokio::sync::{mpsc, watch};
use tracing::{info, instrument, warn};

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub prune_interval_secs: u64,
    pub retention_days: u32,
    /// Cron expression for compaction (local time).
    pub vacuum_schedule: Option<String>,
    /// Compaction period when `vacuum_schedule` is not set.
    pub vacuum_interval_secs: u64,
}

impl From<&DatabaseConfig> for MaintenanceConfig {
    fn from(db: &DatabaseConfig) -> Self {
        Self {
            prune_interval_secs: db.prune_interval_secs,
            retention_days: db.retention_days,
            vacuum_schedule: db.vacuum_schedule.clone(),
            vacuum_interval_secs: db.vacuum_interval_secs,
        }
    }
}

/// Deletes everything older than `retention_days` before now. Returns rows removed.
pub async fn prune_once<K: PersistenceSink>(
    sink: &K,
    retention_days: u32,
) -> Result<u64, PersistenceError> {
    let cutoff = now_ms().saturating_sub(retention_days as u64 * MS_PER_DAY);
    sink.cleanup_older_than(cutoff).await
}

/// Runs until `shutdown` flips to true or its sender is dropped.
pub fn spawn<K: PersistenceSink>(
    sink: Arc<K>,
    config: MaintenanceConfig,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(sink, config, shutdown))
}

#[instrument(skip_all, fields(prune_interval_secs = config.prune_interval_secs))]
async fn run<K: PersistenceSink>(
    sink: Arc<K>,
    config: MaintenanceConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut prune_tick = tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));
    let mut pruned_total: u64 = 0;

    loop {
        tokio::select! {
            _ = prune_tick.tick() => {
                match prune_once(sink.as_ref(), config.retention_days).await {
                    Ok(rows) => {
                        pruned_total += rows;
                        tracing::debug!(operation = "cleanup_older_than", rows, pruned_total, "old records pruned");
                    }
                    Err(e) => warn!(error = %e, operation = "cleanup_older_than", "prune failed"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = sink.compact().await {
                    warn!(error = %e, operation = "compact", "compaction failed");
                } else {
                    info!("compaction complete");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    scheduler.abort();
    tracing::debug!("maintenance task shutting down");
}

/// Sends on `tx` at each compaction time (cron or fixed interval). Uses local time for cron.
async fn vacuum_scheduler(config: MaintenanceConfig, tx: mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; compaction will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            if let Some(next) = schedule.after(&now).next() {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
