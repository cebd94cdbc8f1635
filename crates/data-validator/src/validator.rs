//! Data Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Classifier confidence valid range
    pub confidence_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_range: (0.0, 1.0),
        }
    }
}

/// A value forced into its valid range
#[derive(Debug, Clone, PartialEq)]
pub struct Clamped {
    /// Value after clamping
    pub value: f64,
    /// Diagnostic describing the original value, if it had to be clamped
    pub diagnostic: Option<ValidationError>,
}

/// Result of validating a group of fields
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create an empty, valid result
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
        }
    }

    /// Record the outcome of one field check
    pub fn check(&mut self, outcome: Result<(), ValidationError>) -> &mut Self {
        if let Err(err) = outcome {
            self.errors.push(err);
        }
        self
    }

    /// Collapse into the first error, if any
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Validator for classifier output and engine settings
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a classifier confidence
    pub fn validate_confidence(&self, confidence: f64) -> Result<(), ValidationError> {
        self.validate_range("confidence", confidence, self.config.confidence_range)
    }

    /// Clamp a classifier confidence into range
    ///
    /// Values above or below the range go to the nearest bound. NaN carries
    /// no evidence and maps to the lower bound.
    pub fn clamp_confidence(&self, confidence: f64) -> Clamped {
        let (min, max) = self.config.confidence_range;
        match self.validate_confidence(confidence) {
            Ok(()) => Clamped {
                value: confidence,
                diagnostic: None,
            },
            Err(err) => {
                let value = if confidence.is_nan() {
                    min
                } else {
                    confidence.clamp(min, max)
                };
                Clamped {
                    value,
                    diagnostic: Some(err),
                }
            }
        }
    }

    /// Validate a probability-valued setting (inclusive [0, 1])
    pub fn validate_probability(
        &self,
        field: &'static str,
        value: f64,
    ) -> Result<(), ValidationError> {
        self.validate_range(field, value, (0.0, 1.0))
    }

    /// Validate a count or duration setting is non-zero
    pub fn validate_positive(&self, field: &'static str, value: u64) -> Result<(), ValidationError> {
        if value == 0 {
            Err(ValidationError::NotPositive { field })
        } else {
            Ok(())
        }
    }

    /// Validate that one setting does not exceed another
    pub fn validate_not_exceeding(
        &self,
        field: &'static str,
        value: u64,
        limit_field: &'static str,
        limit: u64,
    ) -> Result<(), ValidationError> {
        if value > limit {
            Err(ValidationError::Exceeds {
                field,
                value,
                limit_field,
                limit,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
