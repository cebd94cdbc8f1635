//! Per-tick engine output

use crate::accuracy::ACCURACY_PRIOR_PERCENT;
use crate::observation::{EyeLabel, EyeReading};
use data_validator::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the presentation layer reads after every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    /// Eyes seen this tick
    pub total_eyes: u32,
    pub open_eyes: u32,
    pub closed_eyes: u32,

    /// Open eyes as a share of this tick's eyes
    pub open_rate_percent: f64,

    /// Rising edges since the session started
    pub drowsiness_alerts: u64,

    /// Whether the drowsiness alert is currently raised
    pub alert_active: bool,

    /// Current hysteresis counter value
    pub alert_counter: u32,

    /// Confidence-derived display percentage (85.0 to 99.5), not a validated accuracy
    pub accuracy_percent: f64,

    /// Ticks evaluated so far
    pub tick: u64,

    /// Timestamp of the tick that produced this snapshot (ms since epoch)
    pub timestamp_ms: u64,
}

impl Default for DetectionSnapshot {
    fn default() -> Self {
        Self {
            total_eyes: 0,
            open_eyes: 0,
            closed_eyes: 0,
            open_rate_percent: 0.0,
            drowsiness_alerts: 0,
            alert_active: false,
            alert_counter: 0,
            accuracy_percent: ACCURACY_PRIOR_PERCENT,
            tick: 0,
            timestamp_ms: 0,
        }
    }
}

/// Emitted once on the tick the alert turns on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// 1-based alert number within the session
    pub alert_number: u64,
    /// Tick on which the edge occurred
    pub tick: u64,
    pub timestamp_ms: u64,
}

/// Overlay entry for one eye of the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeOverlay {
    pub face_index: u32,
    pub eye_index: u32,
    pub label: EyeLabel,
}

impl From<&EyeReading> for EyeOverlay {
    fn from(reading: &EyeReading) -> Self {
        Self {
            face_index: reading.face_index,
            eye_index: reading.eye_index,
            label: reading.label(),
        }
    }
}

/// Complete result of one tick
#[derive(Debug, Clone, Serialize)]
pub struct TickOutcome {
    pub snapshot: DetectionSnapshot,

    /// Present only on the rising edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_rising_edge: Option<AlertEvent>,

    /// Display label per eye, in fold order
    pub eyes: Vec<EyeOverlay>,

    /// Readings whose confidence had to be clamped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ValidationError>,

    /// Wall time spent in the tick
    #[serde(skip)]
    pub duration: Duration,
}

impl TickOutcome {
    pub fn has_rising_edge(&self) -> bool {
        self.alert_rising_edge.is_some()
    }
}
