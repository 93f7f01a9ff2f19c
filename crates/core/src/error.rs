//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid owner: {0}")]
    InvalidOwner(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
