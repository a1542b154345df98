//! Authentication-related types and data structures
//!
//! This module defines the values exchanged with the credential provider
//! (accounts, tokens, requests) and the error taxonomy of the session layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A signed-in identity, as reported by the credential provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier across tenants and sessions
    pub home_account_id: String,
    /// Opaque reference the identity backend uses for this account
    pub local_account_id: String,
    /// Human-readable sign-in name
    pub username: String,
    /// Display name, when the provider has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl Account {
    pub fn new(
        home_account_id: impl Into<String>,
        local_account_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            home_account_id: home_account_id.into(),
            local_account_id: local_account_id.into(),
            username: username.into(),
            name: None,
            tenant_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether two accounts refer to the same identity
    pub fn is_same_identity(&self, other: &Account) -> bool {
        self.home_account_id == other.home_account_id
    }
}

/// Bearer credential handed straight to a caller
///
/// The session layer never stores tokens; the secret is redacted from
/// `Debug` output so it does not leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    secret: String,
    expires_on: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(secret: impl Into<String>, expires_on: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_on,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_on(&self) -> Option<DateTime<Utc>> {
        self.expires_on
    }

    /// Tokens without an expiry never expire
    pub fn is_expired(&self) -> bool {
        self.expires_on
            .map(|expires_on| Utc::now() >= expires_on)
            .unwrap_or(false)
    }

    /// Value for an `Authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.secret)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("secret", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Outcome of a completed interactive or redirect flow
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub account: Account,
    pub id_token: Token,
    pub scopes: Vec<String>,
}

/// Interactive sign-in mechanics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Resolves with the account in the same call
    Popup,
    /// Navigates away; the result arrives on the next load
    Redirect,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::Popup => f.write_str("popup"),
            InteractionMode::Redirect => f.write_str("redirect"),
        }
    }
}

/// How far the provider may go to satisfy a silent request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLookupPolicy {
    /// Cache, then refresh token, then network
    #[default]
    Default,
    AccessToken,
    AccessTokenAndRefreshToken,
    RefreshToken,
    RefreshTokenAndNetwork,
    Skip,
}

/// Request for non-interactive token acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct SilentRequest {
    pub account: Account,
    pub scopes: Vec<String>,
    pub cache_lookup_policy: CacheLookupPolicy,
}

/// Request for an interactive flow
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveRequest {
    pub mode: InteractionMode,
    pub scopes: Vec<String>,
    /// Page to return to once a redirect flow completes
    pub redirect_start_page: Option<Url>,
}

/// Provider failed to initialize; fatal for the rest of the context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("Provider misconfigured: {0}")]
    Misconfigured(String),

    #[error("Provider storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Provider initialization failed: {0}")]
    Other(String),
}

/// Interactive, redirect-consumption or sign-out failure; recoverable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("User cancelled the {0} flow")]
    UserCancelled(InteractionMode),

    #[error("Network error: {0}")]
    NetworkError(String),

    /// A popup flow completed without yielding an account
    #[error("Interactive flow completed without a result")]
    MissingResult,

    #[error("Provider used before initialization")]
    NotInitialized,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// No valid cached credential; the caller decides whether to prompt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SilentAuthError {
    #[error("Interaction required: {0}")]
    InteractionRequired(String),

    #[error("Cached token expired and no refresh path is available")]
    TokenExpired,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider used before initialization")]
    NotInitialized,
}

/// Errors surfaced by the session manager
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// An operation needs `load()` to have completed first
    #[error("Session has not been loaded")]
    NotLoaded,

    #[error(transparent)]
    Init(#[from] InitError),

    /// A previous `load()` failed to initialize the provider
    #[error("Credential provider is unavailable after a failed initialization")]
    ProviderUnavailable,

    #[error(transparent)]
    Flow(#[from] FlowError),

    /// The context navigated away (redirect flow) and is no longer usable
    #[error("Session context has been torn down")]
    TornDown,

    /// Another transition changed the session while a flow was in flight
    #[error("Sign-in was interrupted by another session transition")]
    Interrupted,
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("very-secret", None);
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_token_expiry() {
        let fresh = Token::new("a", Some(Utc::now() + Duration::minutes(5)));
        let stale = Token::new("b", Some(Utc::now() - Duration::minutes(5)));
        let forever = Token::new("c", None);

        assert!(!fresh.is_expired());
        assert!(stale.is_expired());
        assert!(!forever.is_expired());
        assert_eq!(fresh.bearer_header(), "Bearer a");
    }

    #[test]
    fn test_error_conversions() {
        let err: SessionError = FlowError::UserCancelled(InteractionMode::Popup).into();
        assert_eq!(err.to_string(), "User cancelled the popup flow");

        let err: SessionError = InitError::Misconfigured("no client id".into()).into();
        assert!(matches!(err, SessionError::Init(_)));
    }
}
