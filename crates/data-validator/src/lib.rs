//! Data Validation
//!
//! Provides range checking for classifier output and engine settings.
//! Observation values are clamped with a diagnostic; settings are rejected.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Clamped, Validator, ValidationConfig, ValidationResult};
