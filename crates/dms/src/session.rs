//! One monitoring run
//!
//! A `Session` exclusively owns the eye history, the running metrics and the
//! alert counter. Only `tick` mutates them. Dropping the session (or calling
//! `stop`) discards all of it; a new session always starts from scratch.

use crate::accuracy::{AccuracyEstimator, RunningMetrics};
use crate::analysis::{AlertEvent, DetectionSnapshot, EyeOverlay, TickOutcome};
use crate::config::DmsConfig;
use crate::history::EyeStateHistory;
use crate::observation::{EyeReading, Frame, Observation};
use crate::state::{AlertTransition, DrowsinessStateMachine};
use crate::stats::FrameStats;
use crate::{now_ms, DmsError};
use data_validator::Validator;
use metrics::{counter, gauge, histogram};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Live engine state for one monitoring run
#[derive(Debug, Clone)]
pub struct Session {
    config: DmsConfig,
    validator: Validator,
    history: EyeStateHistory,
    estimator: AccuracyEstimator,
    machine: DrowsinessStateMachine,
    frame_stats: FrameStats,
    drowsiness_alerts: u64,
    ticks: u64,
    last_snapshot: DetectionSnapshot,
}

impl Session {
    /// Start a session with validated configuration
    pub fn start(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "Starting DMS session (history {}, window {}, confidence > {}, period {}ms)",
            config.history_size,
            config.drowsiness_threshold,
            config.confidence_threshold,
            config.sampling_period_ms
        );

        Ok(Self {
            validator: Validator::default(),
            history: EyeStateHistory::new(config.history_size),
            estimator: AccuracyEstimator::new(config.confidence_threshold),
            machine: DrowsinessStateMachine::new(
                config.drowsiness_threshold,
                config.confidence_threshold,
            ),
            frame_stats: FrameStats::default(),
            drowsiness_alerts: 0,
            ticks: 0,
            last_snapshot: DetectionSnapshot::default(),
            config,
        })
    }

    /// Fold one frame stamped with the current time
    pub fn tick(&mut self, frame: &Frame) -> TickOutcome {
        self.tick_at(frame, now_ms())
    }

    /// Fold one frame and evaluate the drowsiness window
    ///
    /// Readings are validated before any state is touched; the commit that
    /// follows cannot fail, so a tick is applied completely or not at all.
    pub fn tick_at(&mut self, frame: &Frame, timestamp_ms: u64) -> TickOutcome {
        let started = Instant::now();

        let mut diagnostics = Vec::new();
        let mut eyes = Vec::with_capacity(frame.len());
        let observations: Vec<Observation> = frame
            .readings()
            .iter()
            .map(|reading| {
                let clamped = self.validator.clamp_confidence(reading.confidence);
                if let Some(diagnostic) = clamped.diagnostic {
                    warn!(
                        "Face {} eye {}: clamped to {} ({})",
                        reading.face_index, reading.eye_index, clamped.value, diagnostic
                    );
                    diagnostics.push(diagnostic);
                }
                let reading = EyeReading {
                    confidence: clamped.value,
                    ..*reading
                };
                eyes.push(EyeOverlay::from(&reading));
                Observation::new(reading.is_open, reading.confidence, timestamp_ms)
            })
            .collect();

        for observation in &observations {
            self.history.push(*observation);
            self.estimator.update(observation.confidence());
        }

        self.frame_stats.reset();
        for observation in &observations {
            self.frame_stats.record(observation);
        }

        // A tick that adds no observation adds no closed-eye evidence
        let window_drowsy =
            !observations.is_empty() && self.machine.window_drowsy(&self.history);
        let transition = self.machine.tick(window_drowsy);
        self.ticks += 1;

        let alert_rising_edge = match transition {
            AlertTransition::Rising => {
                self.drowsiness_alerts += 1;
                warn!(
                    "Drowsiness alert #{} raised at tick {}",
                    self.drowsiness_alerts, self.ticks
                );
                Some(AlertEvent {
                    alert_number: self.drowsiness_alerts,
                    tick: self.ticks,
                    timestamp_ms,
                })
            }
            AlertTransition::Falling => {
                info!("Drowsiness alert cleared at tick {}", self.ticks);
                None
            }
            AlertTransition::Steady => None,
        };

        let snapshot = DetectionSnapshot {
            total_eyes: self.frame_stats.total_eyes,
            open_eyes: self.frame_stats.open_eyes,
            closed_eyes: self.frame_stats.closed_eyes,
            open_rate_percent: self.frame_stats.open_rate_percent(),
            drowsiness_alerts: self.drowsiness_alerts,
            alert_active: self.machine.alert_active(),
            alert_counter: self.machine.counter(),
            accuracy_percent: self.estimator.estimate(),
            tick: self.ticks,
            timestamp_ms,
        };
        self.last_snapshot = snapshot;

        let duration = started.elapsed();
        debug!(
            "Tick {}: {} eyes ({} open), counter {}, {:?}",
            self.ticks,
            snapshot.total_eyes,
            snapshot.open_eyes,
            snapshot.alert_counter,
            duration
        );

        counter!("dms_ticks_total").increment(1);
        counter!("dms_observations_total").increment(observations.len() as u64);
        counter!("dms_observations_clamped_total").increment(diagnostics.len() as u64);
        if alert_rising_edge.is_some() {
            counter!("dms_drowsiness_alerts_total").increment(1);
        }
        gauge!("dms_alert_counter").set(f64::from(snapshot.alert_counter));
        gauge!("dms_accuracy_percent").set(snapshot.accuracy_percent);
        histogram!("dms_tick_duration_seconds").record(duration.as_secs_f64());

        TickOutcome {
            snapshot,
            alert_rising_edge,
            eyes,
            diagnostics,
            duration,
        }
    }

    /// End the session, returning its final snapshot
    pub fn stop(self) -> DetectionSnapshot {
        info!(
            "Stopping DMS session after {} ticks ({} alerts)",
            self.ticks, self.drowsiness_alerts
        );
        self.last_snapshot
    }

    /// Snapshot of the most recent tick (initial values before any tick)
    pub fn snapshot(&self) -> DetectionSnapshot {
        self.last_snapshot
    }

    pub fn history(&self) -> &EyeStateHistory {
        &self.history
    }

    pub fn running_metrics(&self) -> RunningMetrics {
        self.estimator.metrics()
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.estimator.estimate()
    }

    pub fn alert_counter(&self) -> u32 {
        self.machine.counter()
    }

    pub fn alert_active(&self) -> bool {
        self.machine.alert_active()
    }

    /// Rising edges so far
    pub fn drowsiness_alerts(&self) -> u64 {
        self.drowsiness_alerts
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }
}
