//! Error types for REST calls and their retry classification.

use thiserror::Error;

/// How a failed call should be treated by the retry executor and the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Intentional abort. Never retried, never shown to the user.
    Cancellation,
    /// Network trouble where repeating the identical request may succeed.
    Transient,
    /// Server-confirmed rejection. Retrying is futile.
    Permanent,
}

/// Errors that can occur while talking to the SkillBridge API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller cancelled the call or the owning widget was torn down
    #[error("Request cancelled")]
    Cancelled,

    /// The call exceeded its fixed timeout
    #[error("Request timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The server could not be reached
    #[error("Network error contacting '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the endpoint's schema
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Cancelled => ErrorClass::Cancellation,
            ApiError::Timeout { .. } | ApiError::Network { .. } => ErrorClass::Transient,
            ApiError::Status { status, .. } => match status {
                408 | 502 | 503 | 504 => ErrorClass::Transient,
                _ => ErrorClass::Permanent,
            },
            ApiError::Decode { .. } | ApiError::InvalidRequest(_) => ErrorClass::Permanent,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.class() == ErrorClass::Cancellation
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// Short identifier used as a structured log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Cancelled => "cancelled",
            ApiError::Timeout { .. } => "timeout",
            ApiError::Network { .. } => "network_error",
            ApiError::Status { .. } => "status_error",
            ApiError::Decode { .. } => "decode_error",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }
}
