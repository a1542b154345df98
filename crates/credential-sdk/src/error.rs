//! Error types for the credential service client

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by [`crate::CredentialServiceClient`]
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The service rejected the presented credential
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Any other non-success response
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Success status with a body that does not match the expected shape
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Rejected before anything was sent
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::HttpClient(e) => e.is_timeout() || e.is_connect(),
            ApiError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Error body shared by every route: `{"message": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
