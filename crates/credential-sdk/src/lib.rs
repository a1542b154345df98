//! Credential SDK
//!
//! Client-side identity session management for the credential service:
//! - Session lifecycle over a pluggable credential provider
//! - Silent token acquisition for the active account
//! - HTTP client for exchanging identity tokens for service credentials

pub mod app;
pub mod auth;
pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use app::{AppError, AppResult, CredentialApp};
pub use auth::{
    Account, CredentialProvider, InteractionMode, LocalTokenProvider, Session, SessionChange,
    SessionError, SessionManager, SessionObserver, SessionState, SignInOutcome, Token,
};
pub use client::{ClientBuilder, CredentialServiceClient};
pub use error::{ApiError, Result};
pub use types::{ApiKey, Credential, CredentialCheck};
