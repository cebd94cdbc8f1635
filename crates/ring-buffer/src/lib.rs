//! Bounded Ring Buffer
//!
//! Provides a fixed-capacity FIFO buffer that evicts its oldest entry on
//! overflow. Used to hold the most recent eye observations of a session.

mod buffer;

pub use buffer::RingBuffer;
