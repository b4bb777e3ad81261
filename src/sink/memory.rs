use super::PersistenceSink;
use crate::error::PersistenceError;
use crate::models::{MetricFamily, Record};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// In-process sink. Useful for embedding without a database and for tests; writes can be
/// made to fail on demand with [`MemorySink::set_failing`].
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
    failing: AtomicBool,
    rejected: AtomicU64,
    compactions: AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records refused while failing.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn compactions(&self) -> u64 {
        self.compactions.load(Ordering::Relaxed)
    }

    fn check_available(&self, n: usize) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::Relaxed) {
            self.rejected.fetch_add(n as u64, Ordering::Relaxed);
            return Err(PersistenceError::Unavailable("memory sink set to fail".into()));
        }
        Ok(())
    }
}

impl PersistenceSink for MemorySink {
    async fn save(&self, record: &Record) -> Result<(), PersistenceError> {
        self.check_available(1)?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn save_batch(&self, records: &[Record]) -> Result<(), PersistenceError> {
        self.check_available(records.len())?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(records);
        Ok(())
    }

    async fn query_range(
        &self,
        family: MetricFamily,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<Vec<Record>, PersistenceError> {
        let mut out: Vec<Record> = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.family() == family && (start_ms..end_ms).contains(&r.timestamp()))
            .cloned()
            .collect();
        out.sort_by_key(Record::timestamp);
        Ok(out)
    }

    async fn cleanup_older_than(&self, cutoff_ms: u64) -> Result<u64, PersistenceError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|r| r.timestamp() >= cutoff_ms);
        Ok((before - records.len()) as u64)
    }

    async fn compact(&self) -> Result<(), PersistenceError> {
        self.compactions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
