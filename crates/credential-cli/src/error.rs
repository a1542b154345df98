//! Error types for the credential CLI

use color_eyre::eyre::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file issues
    #[error("Configuration error: {0}")]
    Config(#[from] credential_common::ConfigError),

    /// Session or service failures
    #[error(transparent)]
    App(#[from] credential_sdk::AppError),

    /// Requested something this binary cannot do
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Everything else
    #[error(transparent)]
    Internal(#[from] Report),
}

impl From<credential_sdk::ApiError> for CliError {
    fn from(e: credential_sdk::ApiError) -> Self {
        CliError::App(e.into())
    }
}

impl From<credential_sdk::SessionError> for CliError {
    fn from(e: credential_sdk::SessionError) -> Self {
        CliError::App(e.into())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
