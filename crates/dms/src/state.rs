//! Drowsiness state tracking
//!
//! A hysteresis counter over the sliding window of recent observations.
//! Every tick the window is judged: a fully, confidently closed window adds
//! one to the counter, anything else takes one away (floored at zero). The
//! alert is active while the counter is at or above the window length, so a
//! single open frame can neither raise nor clear it instantly.

use crate::history::EyeStateHistory;
use crate::observation::Observation;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Change of the derived alert state on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTransition {
    /// Counter reached the threshold from below
    Rising,
    /// Counter dropped below the threshold
    Falling,
    Steady,
}

/// Hysteresis counter producing the drowsiness alert
#[derive(Debug, Clone)]
pub struct DrowsinessStateMachine {
    /// Window length and alert threshold
    window: u32,
    confidence_threshold: f64,
    counter: u32,
}

impl DrowsinessStateMachine {
    pub fn new(window: u32, confidence_threshold: f64) -> Self {
        Self {
            window,
            confidence_threshold,
            counter: 0,
        }
    }

    /// Closed with confidence strictly above the threshold
    pub fn is_confidently_closed(&self, observation: &Observation) -> bool {
        !observation.is_open() && observation.confidence() > self.confidence_threshold
    }

    /// Whether the last `window` observations are all confidently closed
    ///
    /// A history shorter than the window is never drowsy.
    pub fn window_drowsy(&self, history: &EyeStateHistory) -> bool {
        let window = self.window as usize;
        if history.len() < window {
            return false;
        }
        history
            .recent_window(window)
            .all(|obs| self.is_confidently_closed(obs))
    }

    /// Advance the counter by one evaluation
    pub fn tick(&mut self, window_drowsy: bool) -> AlertTransition {
        let was_active = self.alert_active();
        self.counter = if window_drowsy {
            self.counter.saturating_add(1)
        } else {
            self.counter.saturating_sub(1)
        };
        let transition = match (was_active, self.alert_active()) {
            (false, true) => AlertTransition::Rising,
            (true, false) => AlertTransition::Falling,
            _ => AlertTransition::Steady,
        };
        debug!(
            "Drowsiness counter {} (window drowsy: {}, {:?})",
            self.counter, window_drowsy, transition
        );
        transition
    }

    pub fn alert_active(&self) -> bool {
        self.counter >= self.window
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn window(&self) -> u32 {
        self.window
    }
}
