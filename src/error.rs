//! Error types for the turtle status agent
//!
//! Provides structured error types for status validation, registry access,
//! and query operations.

use thiserror::Error;

use crate::validator::ValidationFault;

/// Main error type for status agent operations
#[derive(Error, Debug)]
pub enum StatusError {
    /// A status payload failed schema validation; carries field-level detail
    #[error("status payload failed validation ({} fault(s))", faults.len())]
    Validation { faults: Vec<ValidationFault> },

    /// Malformed call into a collaborator (e.g. an empty turtle id)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Query for a turtle id that is not registered
    #[error("turtle '{0}' does not exist")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl StatusError {
    /// Create a validation error from a list of faults
    pub fn validation(faults: Vec<ValidationFault>) -> Self {
        StatusError::Validation { faults }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        StatusError::InvalidArgument(msg.into())
    }

    /// Create a not-found error for a turtle id
    pub fn not_found(id: impl Into<String>) -> Self {
        StatusError::NotFound(id.into())
    }

    /// The structured fault list, if this is a validation error
    pub fn faults(&self) -> Option<&[ValidationFault]> {
        match self {
            StatusError::Validation { faults } => Some(faults),
            _ => None,
        }
    }

    /// Check if this error is recoverable at the ingest path (logged and
    /// dropped) rather than a collaborator programming error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StatusError::Validation { .. } | StatusError::Serialization(_)
        )
    }
}

/// Result type alias for status agent operations
pub type Result<T> = std::result::Result<T, StatusError>;
