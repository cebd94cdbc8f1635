//! Per-tick eye counts for display

use crate::observation::Observation;
use serde::{Deserialize, Serialize};

/// Eye counts for the current tick only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub total_eyes: u32,
    pub open_eyes: u32,
    pub closed_eyes: u32,
}

impl FrameStats {
    /// Start a new tick
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record(&mut self, observation: &Observation) {
        self.total_eyes += 1;
        if observation.is_open() {
            self.open_eyes += 1;
        } else {
            self.closed_eyes += 1;
        }
    }

    /// Share of open eyes this tick (0 when no eyes were seen)
    pub fn open_rate_percent(&self) -> f64 {
        if self.total_eyes == 0 {
            0.0
        } else {
            100.0 * f64::from(self.open_eyes) / f64::from(self.total_eyes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(observations: &[Observation]) -> FrameStats {
        let mut stats = FrameStats::default();
        for observation in observations {
            stats.record(observation);
        }
        stats
    }

    #[test]
    fn test_record() {
        let stats = tally(&[
            Observation::new(true, 0.9, 0),
            Observation::new(false, 0.8, 0),
            Observation::new(true, 0.3, 0),
        ]);

        assert_eq!(stats.total_eyes, 3);
        assert_eq!(stats.open_eyes, 2);
        assert_eq!(stats.closed_eyes, 1);
        assert!((stats.open_rate_percent() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_reset_and_empty_rate() {
        let mut stats = tally(&[Observation::new(false, 0.9, 0)]);
        stats.reset();
        assert_eq!(stats, FrameStats::default());
        assert_eq!(stats.open_rate_percent(), 0.0);
    }
}
