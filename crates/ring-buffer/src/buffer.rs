//! Ring Buffer Implementation

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer
///
/// Pushing into a full buffer evicts the oldest entry. Relative arrival
/// order of the retained entries is always preserved.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Retained entries, oldest at the front
    storage: VecDeque<T>,
    /// Capacity of the buffer
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    ///
    /// A zero capacity is bumped to one so that the most recent entry is
    /// always retrievable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an entry, returning the evicted entry if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.storage.len() >= self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(item);
        evicted
    }

    /// Number of entries currently retained
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterate over the last `count` entries in arrival order (oldest first)
    pub fn iter_last(&self, count: usize) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        let skip = self.storage.len().saturating_sub(count);
        self.storage.iter().skip(skip)
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy out the last `count` entries in arrival order (oldest first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        self.iter_last(count).cloned().collect()
    }
}

impl<T: Serialize> Serialize for RingBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.storage.iter())
    }
}
