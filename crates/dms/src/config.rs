//! DMS configuration

use data_validator::{ValidationError, ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of recent observations retained per session
pub const HISTORY_SIZE: usize = 30;

/// Sliding window length and alert counter threshold
pub const DROWSINESS_THRESHOLD: u32 = 8;

/// Minimum confidence for an observation to count as evidence
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Reference sampling period (10Hz)
pub const SAMPLING_PERIOD_MS: u64 = 100;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Observations kept in the eye state history
    pub history_size: usize,

    /// Sliding window length, also the counter value that raises the alert
    pub drowsiness_threshold: u32,

    /// Confidence an observation must exceed to count as evidence
    pub confidence_threshold: f64,

    /// Tick period of the external driver (milliseconds)
    pub sampling_period_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            history_size: HISTORY_SIZE,
            drowsiness_threshold: DROWSINESS_THRESHOLD,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            sampling_period_ms: SAMPLING_PERIOD_MS,
        }
    }
}

impl DmsConfig {
    /// Sampling period as a duration
    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(self.sampling_period_ms)
    }

    /// Reject settings outside their valid domains
    ///
    /// Nothing is clamped here: a bad value is a configuration mistake.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let validator = Validator::default();
        let mut result = ValidationResult::new();
        result
            .check(validator.validate_positive("history_size", self.history_size as u64))
            .check(validator.validate_positive(
                "drowsiness_threshold",
                u64::from(self.drowsiness_threshold),
            ))
            .check(validator.validate_not_exceeding(
                "drowsiness_threshold",
                u64::from(self.drowsiness_threshold),
                "history_size",
                self.history_size as u64,
            ))
            .check(validator.validate_probability("confidence_threshold", self.confidence_threshold))
            .check(validator.validate_positive("sampling_period_ms", self.sampling_period_ms));
        result.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DmsConfig::default();
        assert_eq!(config.history_size, 30);
        assert_eq!(config.drowsiness_threshold, 8);
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.sampling_period(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let config = DmsConfig {
            drowsiness_threshold: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::NotPositive {
                field: "drowsiness_threshold"
            })
        );
    }

    #[test]
    fn test_rejects_confidence_outside_unit_interval() {
        for bad in [-0.1, 1.01, f64::NAN] {
            let config = DmsConfig {
                confidence_threshold: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_rejects_window_larger_than_history() {
        let config = DmsConfig {
            history_size: 6,
            drowsiness_threshold: 8,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Exceeds { field: "drowsiness_threshold", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_period_and_history() {
        let config = DmsConfig {
            sampling_period_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DmsConfig {
            history_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: DmsConfig = serde_json::from_str(r#"{ "drowsiness_threshold": 4 }"#).unwrap();
        assert_eq!(config.drowsiness_threshold, 4);
        assert_eq!(config.history_size, HISTORY_SIZE);
    }
}
