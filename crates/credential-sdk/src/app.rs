//! Application glue between the session manager and the credential service
//!
//! [`CredentialApp`] runs the end-to-end flows a front end offers: sign in
//! and establish the service cookie, mint an API key, sign out everywhere,
//! and check a credential against the service.

use crate::auth::{
    InteractionMode, Session, SessionError, SessionManager, SignInOutcome, SilentAuthError, Token,
};
use crate::client::CredentialServiceClient;
use crate::error::ApiError;
use crate::types::{ApiKey, Credential, CredentialCheck};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to acquire identity token: {0}")]
    Token(#[from] SilentAuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Not signed in, so there is no identity token to exchange
    #[error("No identity token available, sign in first")]
    NoIdToken,

    #[error("No API key given")]
    EmptyApiKey,
}

pub type AppResult<T> = std::result::Result<T, AppError>;

pub struct CredentialApp {
    session: SessionManager,
    client: CredentialServiceClient,
}

impl CredentialApp {
    pub fn new(session: SessionManager, client: CredentialServiceClient) -> Self {
        Self { session, client }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn client(&self) -> &CredentialServiceClient {
        &self.client
    }

    /// Load the session for this context
    pub async fn load(&self) -> AppResult<Session> {
        Ok(self.session.load().await?)
    }

    /// Sign in and exchange the identity token for the service cookie
    ///
    /// Nothing is sent to the service while a redirect is under way or another
    /// transition holds the session.
    pub async fn sign_in(&self, mode: InteractionMode) -> AppResult<SignInOutcome> {
        let outcome = self.session.sign_in(mode).await?;
        match outcome {
            SignInOutcome::SignedIn(_) | SignInOutcome::AlreadySignedIn(_) => {
                let token = self.id_token().await?;
                self.client.login(&token).await?;
            }
            SignInOutcome::Redirecting | SignInOutcome::InProgress => {
                debug!("Sign-in did not complete in this context, skipping service login");
            }
        }
        Ok(outcome)
    }

    /// Exchange the identity token for a long-lived API key
    pub async fn create_api_key(&self) -> AppResult<ApiKey> {
        let token = self.id_token().await?;
        Ok(self.client.create_api_key(&token).await?)
    }

    /// End the provider session, then clear the service cookie
    pub async fn sign_out(&self) -> AppResult<()> {
        self.session.sign_out().await?;
        if let Err(e) = self.client.logout().await {
            warn!("Signed out locally but the service logout failed: {e}");
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn check_api_key(&self, key: &str) -> AppResult<CredentialCheck> {
        if key.trim().is_empty() {
            return Err(AppError::EmptyApiKey);
        }
        Ok(self
            .client
            .check_credentials(Credential::ApiKey(key.to_string()))
            .await?)
    }

    pub async fn check_auth_cookie(&self) -> AppResult<CredentialCheck> {
        Ok(self.client.check_credentials(Credential::Cookie).await?)
    }

    async fn id_token(&self) -> AppResult<Token> {
        self.session.get_token().await?.ok_or(AppError::NoIdToken)
    }
}
