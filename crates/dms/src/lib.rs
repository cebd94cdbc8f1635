//! Driver Monitoring System (DMS)
//!
//! Temporal drowsiness inference over per-frame eye classifications:
//! - Bounded history of recent eye observations
//! - Hysteresis counter over a sliding window (flicker-resistant alert)
//! - Confidence-derived accuracy percentage for display
//! - Per-tick eye counts
//!
//! Camera capture, face/eye localization and the open/closed classifier are
//! external; the engine only consumes `(is_open, confidence)` readings.

pub mod accuracy;
pub mod analysis;
pub mod config;
pub mod driver;
pub mod history;
pub mod monitor;
pub mod observation;
pub mod session;
pub mod state;
pub mod stats;

pub use accuracy::{AccuracyEstimator, RunningMetrics};
pub use analysis::{AlertEvent, DetectionSnapshot, EyeOverlay, TickOutcome};
pub use config::DmsConfig;
pub use driver::{ObservationSource, ReplaySource, TickDriver};
pub use history::EyeStateHistory;
pub use monitor::{Monitor, SessionStatus};
pub use observation::{EyeLabel, EyeReading, Frame, Observation};
pub use session::Session;
pub use state::{AlertTransition, DrowsinessStateMachine};
pub use stats::FrameStats;

use data_validator::ValidationError;
use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("No monitoring session is running")]
    SessionNotStarted,

    #[error("A monitoring session is already running")]
    SessionAlreadyStarted,

    #[error("Another tick is still in flight")]
    ReentrantTick,
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
