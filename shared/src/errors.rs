//! Error types for the Fitness Coach domain

use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid clock time '{0}': expected HH:MM")]
    InvalidClockTime(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Invalid callback payload: {0}")]
    InvalidCallback(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        DomainError::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
