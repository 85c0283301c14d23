//! HTTP handler infrastructure for the query surface
//!
//! The handler module exposes the registry read-only over HTTP:
//! - `routes`: route definitions for the fleet listing, per-turtle detail,
//!   health, and metrics endpoints
//!
//! All routes return machine-readable JSON responses wrapped in a common
//! envelope. The HTTP layer never mutates registry state.

pub mod routes;

pub use routes::{create_router, ApiError, HandlerState, HealthResponse, HealthStatus};

use serde::{Deserialize, Serialize};

/// Standard API response wrapper for query results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error information (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Request metadata for tracing
    pub metadata: ResponseMetadata,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ResponseMetadata::new(request_id),
        }
    }

    /// Create an error response
    pub fn error(error: ErrorInfo, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            metadata: ResponseMetadata::new(request_id),
        }
    }
}

/// Error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response metadata for tracing and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Unique request identifier
    pub request_id: String,
    /// Timestamp of response generation (ISO 8601)
    pub timestamp: String,
    /// Agent version
    pub version: String,
}

impl ResponseMetadata {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
