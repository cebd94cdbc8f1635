//! Eye state history (bounded FIFO of recent observations)

use crate::observation::Observation;
use ring_buffer::RingBuffer;
use serde::Serialize;

/// Recent observations of a session, oldest first
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EyeStateHistory {
    buffer: RingBuffer<Observation>,
}

impl EyeStateHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RingBuffer::new(capacity),
        }
    }

    /// Append an observation, evicting the oldest when full
    pub fn push(&mut self, observation: Observation) {
        self.buffer.push(observation);
    }

    /// The last `min(n, len)` observations in arrival order
    pub fn recent_window(&self, n: usize) -> impl DoubleEndedIterator<Item = &Observation> + ExactSizeIterator {
        self.buffer.iter_last(n)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Copy of the retained observations, oldest first
    pub fn to_vec(&self) -> Vec<Observation> {
        self.buffer.read_last(self.buffer.len())
    }
}
