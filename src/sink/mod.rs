// Persistence sink: receives records from the history writer; failures never reach the samplers.

mod blob;
mod memory;
mod sqlite;
mod writer;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;
pub use writer::{WriterConfig, WriterStats, spawn_writer, writer_channel_capacity};

use crate::error::PersistenceError;
use crate::models::{MetricFamily, Record};
use std::future::Future;

/// Storage for sampled records, keyed by stream (metric family) and timestamp.
///
/// Writes are fire-and-forget from the sampler's point of view: the writer task logs and drops
/// anything that fails here, and nothing retries.
pub trait PersistenceSink: Send + Sync + 'static {
    fn save(&self, record: &Record) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    fn save_batch(
        &self,
        records: &[Record],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Records of `family` with `start_ms <= timestamp < end_ms`, oldest first.
    fn query_range(
        &self,
        family: MetricFamily,
        start_ms: u64,
        end_ms: u64,
    ) -> impl Future<Output = Result<Vec<Record>, PersistenceError>> + Send;

    /// Deletes everything older than `cutoff_ms`; returns the number of rows removed.
    fn cleanup_older_than(
        &self,
        cutoff_ms: u64,
    ) -> impl Future<Output = Result<u64, PersistenceError>> + Send;

    /// Reclaims storage after deletes. No-op for sinks without on-disk state.
    fn compact(&self) -> impl Future<Output = Result<(), PersistenceError>> + Send {
        async { Ok(()) }
    }
}
