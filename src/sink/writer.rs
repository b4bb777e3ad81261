// Dedicated history writer: samplers hand records over a bounded channel, this task batches
// them into the sink. A failed batch is logged and discarded.

use super::PersistenceSink;
use crate::models::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, interval_at};

/// Channel capacity for the record writer. A full channel drops records at the sampler.
pub fn writer_channel_capacity(flush_rate: u64) -> usize {
    (flush_rate as usize * 2).max(32)
}

#[derive(Debug, Clone, Copy)]
pub struct WriterConfig {
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

/// Counters shared with whoever spawned the writer.
#[derive(Debug, Default)]
pub struct WriterStats {
    pub saved_total: AtomicU64,
    pub dropped_total: AtomicU64,
}

impl WriterStats {
    pub fn saved(&self) -> u64 {
        self.saved_total.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }
}

/// Flushes when the buffer reaches `flush_rate`, every `flush_interval_secs`, and once more
/// when every sender has been dropped; then exits.
pub fn spawn_writer<K: PersistenceSink>(
    mut rx: mpsc::Receiver<Record>,
    sink: Arc<K>,
    config: WriterConfig,
    stats: Arc<WriterStats>,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_secs(config.flush_interval_secs.max(1));
    let flush_rate = (config.flush_rate as usize).max(1);
    tokio::spawn(async move {
        let mut buffer: Vec<Record> = Vec::with_capacity(flush_rate);
        // first tick one full period after start, not immediately
        let mut flush_tick = interval_at(Instant::now() + flush_interval, flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Some(record) => {
                            buffer.push(record);
                            if buffer.len() >= flush_rate {
                                flush_buffer(sink.as_ref(), &mut buffer, &stats).await;
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    flush_buffer(sink.as_ref(), &mut buffer, &stats).await;
                }
            }
        }
        flush_buffer(sink.as_ref(), &mut buffer, &stats).await;
        tracing::debug!("record writer shutting down");
    })
}

async fn flush_buffer<K: PersistenceSink>(sink: &K, buffer: &mut Vec<Record>, stats: &WriterStats) {
    if buffer.is_empty() {
        return;
    }
    let n = buffer.len();
    match sink.save_batch(buffer).await {
        Ok(()) => {
            stats.saved_total.fetch_add(n as u64, Ordering::Relaxed);
            tracing::debug!(operation = "save_batch", records_count = n, "records saved");
        }
        Err(e) => {
            stats.dropped_total.fetch_add(n as u64, Ordering::Relaxed);
            tracing::warn!(error = %e, operation = "save_batch", records_count = n, "record batch dropped");
        }
    }
    buffer.clear();
}
