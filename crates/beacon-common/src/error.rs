//! Error types for the Beacon operator
//!
//! Errors are structured with fields to aid debugging in production.
//! Validation errors carry the offending field path where one is known so
//! the caller can surface it in a status condition.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Beacon operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for CRD specs
    #[error("validation error for {beacon}: {message}")]
    Validation {
        /// Name of the Beacon with the invalid configuration
        beacon: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.networkPublishing.proxy")
        field: Option<String>,
    },
}

impl Error {
    /// Create a validation error with the given message
    ///
    /// For simple validation errors without Beacon context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            beacon: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with Beacon context
    pub fn validation_for(beacon: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            beacon: beacon.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with Beacon context and field path
    pub fn validation_for_field(
        beacon: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            beacon: beacon.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Returns true if the operation that produced this error is worth
    /// retrying without a spec change
    ///
    /// Validation errors are permanent: retrying cannot succeed until the
    /// Beacon spec itself changes, so the caller should await a new
    /// generation instead of requeuing.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Kube { .. } => true,
            Self::Validation { .. } => false,
        }
    }
}
