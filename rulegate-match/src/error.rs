//! Error types for rule text validation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ValidateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("Invalid format '{input}': {reason}")]
    InvalidFormat { input: String, reason: &'static str },

    #[error("Value {value} out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("Interval {interval} is not a multiple of a {unit}")]
    NotAligned { interval: i64, unit: &'static str },

    #[error("Not found: {name}")]
    NotFound { name: String },
}

impl ValidateError {
    pub(crate) fn invalid(input: &str, reason: &'static str) -> Self {
        tracing::debug!("Rejected '{}': {}", input, reason);
        ValidateError::InvalidFormat {
            input: input.to_string(),
            reason,
        }
    }
}
