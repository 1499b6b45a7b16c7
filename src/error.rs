//! Error types for bactident.
//!
//! Errors are strongly typed using thiserror. Note that malformed *data*
//! (odd profile shapes, garbage sample values) never produces an error: it
//! degrades to the `unknown` sentinels instead. The types here cover contract
//! violations and collaborator failures only.

use thiserror::Error;

use crate::cache::StorageError;

/// Validation errors raised at the call boundary for contract violations.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Weight table is empty")]
    EmptyWeightTable,

    #[error("Weight {weight} for '{key}' exceeds maximum of {max}")]
    WeightOutOfRange {
        key: String,
        weight: u8,
        max: u8,
    },

    #[error("Attribute '{key}' appears more than once in the weight table")]
    DuplicateWeight {
        key: String,
    },

    #[error("Unknown attribute: '{name}'")]
    UnknownAttribute {
        name: String,
    },

    #[error("Unknown weight preset: '{name}'")]
    UnknownPreset {
        name: String,
    },

    #[error("Invalid lookup path for '{key}': {reason}")]
    InvalidPath {
        key: String,
        reason: String,
    },

    #[error("Invalid configuration field '{field}': {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

/// Failures of the external profile source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
    },

    #[error("Failed to decode response: {message}")]
    Decode {
        message: String,
    },

    #[error("Profile source is not available: {reason}")]
    Unavailable {
        reason: String,
    },
}

/// Top-level error type for bactident.
#[derive(Debug, Error)]
pub enum IdentError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl IdentError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a fetch error.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Fetch(e) => match e {
                FetchError::ConnectionFailed { .. } => true,
                FetchError::Http { status, .. } => *status >= 500 || *status == 429,
                _ => false,
            },
            Self::Storage(e) => matches!(e, StorageError::Io(_)),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for bactident operations.
pub type IdentResult<T> = Result<T, IdentError>;
