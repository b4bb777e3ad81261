// Fixed-capacity FIFO history per metric stream.
// One writer (the owning sampler), any number of readers. The write lock is held only for
// the push; readers copy out under a read lock and iterate the copy.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{
    AnrReading, BatteryReading, CpuReading, FrameReading, ResourceReading, now_ms,
};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Items that can be filtered by time.
pub trait Timestamped {
    fn timestamp(&self) -> u64;
}

macro_rules! timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn timestamp(&self) -> u64 {
                self.timestamp
            }
        })*
    };
}

timestamped!(CpuReading, ResourceReading, BatteryReading, FrameReading, AnrReading);

/// Cloning yields another handle onto the same buffer.
#[derive(Debug)]
pub struct RollingHistory<T> {
    capacity: usize,
    buffer: Arc<RwLock<VecDeque<T>>>,
}

impl<T> Clone for RollingHistory<T> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl<T: Clone> RollingHistory<T> {
    /// Capacity below 1 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `item`, dropping the single oldest entry first when full.
    pub fn push(&self, item: T) {
        let mut buffer = self.buffer.write().unwrap_or_else(PoisonError::into_inner);
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(item);
    }

    /// Copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        let buffer = self.buffer.read().unwrap_or_else(PoisonError::into_inner);
        buffer.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<T> {
        let buffer = self.buffer.read().unwrap_or_else(PoisonError::into_inner);
        buffer.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<T: Clone + Timestamped> RollingHistory<T> {
    /// Items from the last `duration_ms` of wall-clock time, oldest first.
    pub fn window(&self, duration_ms: u64) -> Vec<T> {
        self.window_ending_at(duration_ms, now_ms())
    }

    /// Items with `end_ms - duration_ms <= timestamp <= end_ms`, oldest first.
    pub fn window_ending_at(&self, duration_ms: u64, end_ms: u64) -> Vec<T> {
        let start_ms = end_ms.saturating_sub(duration_ms);
        let buffer = self.buffer.read().unwrap_or_else(PoisonError::into_inner);
        buffer
            .iter()
            .filter(|item| {
                let ts = item.timestamp();
                ts >= start_ms && ts <= end_ms
            })
            .cloned()
            .collect()
    }
}
