//! Validation Error Types

use serde::Serialize;
use thiserror::Error;

/// Errors during data validation
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    /// Value must be strictly positive
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    /// Two settings contradict each other
    #[error("{field} ({value}) must not exceed {limit_field} ({limit})")]
    Exceeds {
        field: &'static str,
        value: u64,
        limit_field: &'static str,
        limit: u64,
    },
}
