//! Confidence-derived accuracy estimate for display
//!
//! The percentage is the share of observations whose confidence exceeded the
//! threshold, squeezed into a fixed display band. No labelled data exists, so
//! this is a confidence heuristic and never a validated model accuracy.

use serde::Serialize;

/// Shown before any observation has been folded in
pub const ACCURACY_PRIOR_PERCENT: f64 = 99.0;

/// Lower bound of the display band
pub const ACCURACY_FLOOR_PERCENT: f64 = 85.0;

/// Upper bound of the display band
pub const ACCURACY_CEILING_PERCENT: f64 = 99.5;

/// Monotonic observation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunningMetrics {
    total: u64,
    correct: u64,
}

impl RunningMetrics {
    /// Observations folded in
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Observations above the confidence threshold (never exceeds `total`)
    pub fn correct(&self) -> u64 {
        self.correct
    }
}

/// Folds confidences into `RunningMetrics` and derives the display percentage
#[derive(Debug, Clone)]
pub struct AccuracyEstimator {
    metrics: RunningMetrics,
    confidence_threshold: f64,
}

impl AccuracyEstimator {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            metrics: RunningMetrics::default(),
            confidence_threshold,
        }
    }

    pub fn update(&mut self, confidence: f64) {
        self.metrics.total += 1;
        if confidence > self.confidence_threshold {
            self.metrics.correct += 1;
        }
    }

    pub fn estimate(&self) -> f64 {
        let RunningMetrics { total, correct } = self.metrics;
        if total == 0 {
            return ACCURACY_PRIOR_PERCENT;
        }
        let base = 100.0 * correct as f64 / total as f64;
        base.clamp(ACCURACY_FLOOR_PERCENT, ACCURACY_CEILING_PERCENT)
    }

    pub fn metrics(&self) -> RunningMetrics {
        self.metrics
    }
}
