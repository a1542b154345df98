//! Credential provider trait
//!
//! The identity-provider client library (token validation, popup and
//! redirect mechanics, token cache) sits behind this trait. The session
//! manager only ever talks to it through these six primitives.

use super::types::{
    Account, AuthenticationResult, FlowError, InitError, InteractiveRequest, SilentAuthError,
    SilentRequest, Token,
};
use async_trait::async_trait;

/// Core trait for identity-provider clients
///
/// Ordering contract: `initialize` completes before any other call, and
/// `consume_redirect_result` is called at most once per context.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Prepare the provider. Not safe to call concurrently with itself.
    async fn initialize(&self) -> Result<(), InitError>;

    /// Result of a redirect flow this context resumes, if any
    async fn consume_redirect_result(&self) -> Result<Option<AuthenticationResult>, FlowError>;

    /// Token from the provider's cache or refresh path, without user interaction
    ///
    /// Failing here is expected whenever nothing valid is cached.
    async fn acquire_token_silently(&self, request: &SilentRequest) -> Result<Token, SilentAuthError>;

    /// Run a popup or redirect flow
    ///
    /// Popup resolves with the result; redirect navigates away and yields
    /// `None` in the current context.
    async fn run_interactive(
        &self,
        request: &InteractiveRequest,
    ) -> Result<Option<AuthenticationResult>, FlowError>;

    /// All locally cached accounts, in provider order
    fn list_cached_accounts(&self) -> Vec<Account>;

    /// Invalidate local session state for `account` (all accounts when `None`)
    async fn end_session(&self, account: Option<Account>) -> Result<(), FlowError>;
}
