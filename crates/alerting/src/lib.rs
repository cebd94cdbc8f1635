//! Alerting System
//!
//! Consumes drowsiness rising edges from the engine, applies cooldown and
//! hourly throttling, and delivers notifications to registered sinks.
//! Throttling only affects delivery; the engine's alert count is untouched.

mod manager;
mod sink;

pub use manager::{AlertConfig, AlertManager, AlertNotification, AlertState};
pub use sink::{AlertSink, ChannelSink, LogSink};

use thiserror::Error;

/// Alert delivery errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("Sink {0} is closed")]
    SinkClosed(String),

    #[error("Sink {0} is full")]
    SinkFull(String),
}
