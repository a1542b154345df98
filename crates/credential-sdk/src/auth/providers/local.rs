//! Local development credential provider
//!
//! Stands in for the hosted identity provider when the credential service
//! runs in local-JWT mode. Tokens are unsigned "source" tokens carrying the
//! `local_auth` claim; the service accepts them only in that mode.

use crate::auth::provider::CredentialProvider;
use crate::auth::types::{
    Account, AuthenticationResult, FlowError, InitError, InteractionMode, InteractiveRequest,
    SilentAuthError, SilentRequest, Token,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use credential_common::{LocalAuthConfig, LOCAL_AUTH_CLAIM};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Issue an unsigned source token for `user_id`, valid from now for `ttl`
pub fn mint_source_token(user_id: &str, username: &str, ttl: Duration) -> String {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

    let header = json!({ "alg": "none", "typ": "JWT" });
    let mut claims = json!({
        "sub": user_id,
        "name": user_id,
        "preferred_username": username,
        "nbf": now,
        "exp": now.saturating_add(ttl),
    });
    claims[LOCAL_AUTH_CLAIM] = Value::Bool(true);

    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Claims of a decoded source token
#[derive(Debug, Clone)]
struct SourceClaims {
    subject: String,
    name: Option<String>,
    username: Option<String>,
    expires_at: DateTime<Utc>,
    not_before: Option<DateTime<Utc>>,
}

impl SourceClaims {
    fn decode(token: &str) -> Result<Self, String> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err("expected three dot-separated segments".to_string());
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| format!("payload is not base64url: {e}"))?;
        let claims: Value =
            serde_json::from_slice(&payload).map_err(|e| format!("payload is not JSON: {e}"))?;

        if claims.get(LOCAL_AUTH_CLAIM).and_then(Value::as_bool) != Some(true) {
            return Err(format!("missing `{LOCAL_AUTH_CLAIM}` claim"));
        }

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or("missing `sub` claim")?
            .to_string();
        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or("missing or invalid `exp` claim")?;
        let not_before = claims
            .get("nbf")
            .and_then(Value::as_i64)
            .and_then(|nbf| DateTime::from_timestamp(nbf, 0));

        let text = |key: &str| claims.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            subject,
            name: text("name"),
            username: text("preferred_username"),
            expires_at,
            not_before,
        })
    }

    fn account(&self) -> Account {
        let username = self.username.clone().unwrap_or_else(|| self.subject.clone());
        let account = Account::new(format!("{}.local", self.subject), &self.subject, username);
        match &self.name {
            Some(name) => account.with_name(name),
            None => account,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    account: Account,
    id_token: Token,
}

impl CachedEntry {
    fn from_source(token: &str) -> Result<Self, String> {
        let claims = SourceClaims::decode(token)?;
        Ok(Self {
            account: claims.account(),
            id_token: Token::new(token, Some(claims.expires_at)),
        })
    }
}

#[derive(Debug, Default)]
struct LocalState {
    initialized: bool,
    /// Raw tokens handed to the builder, decoded on initialize
    seeded: Vec<String>,
    cache: Vec<CachedEntry>,
    /// Token the next interactive flow issues
    staged: Option<String>,
    pending_redirect: Option<AuthenticationResult>,
}

/// In-process provider backed by source tokens
#[derive(Debug, Default)]
pub struct LocalTokenProvider {
    state: Mutex<LocalState>,
}

impl LocalTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose interactive flow issues the configured source token,
    /// or a freshly minted one
    pub fn from_config(config: &LocalAuthConfig) -> Self {
        let token = config.source_token.clone().unwrap_or_else(|| {
            mint_source_token(
                &config.user_id,
                &config.username,
                config.token_ttl(),
            )
        });
        Self::new().with_interactive_token(token)
    }

    /// Seed the account cache, as if a previous sign-in had happened
    pub fn with_cached_token(self, token: impl Into<String>) -> Self {
        self.state.lock().seeded.push(token.into());
        self
    }

    pub fn with_interactive_token(self, token: impl Into<String>) -> Self {
        self.state.lock().staged = Some(token.into());
        self
    }

    /// Pretend this context is returning from a redirect flow that issued `token`
    pub fn with_redirect_result(self, token: impl Into<String>) -> Result<Self, FlowError> {
        let entry = CachedEntry::from_source(&token.into()).map_err(FlowError::Provider)?;
        {
            let mut state = self.state.lock();
            state.pending_redirect = Some(AuthenticationResult {
                account: entry.account.clone(),
                id_token: entry.id_token.clone(),
                scopes: Vec::new(),
            });
            upsert(&mut state.cache, entry);
        }
        Ok(self)
    }

    fn issue(&self, request: &InteractiveRequest) -> Result<AuthenticationResult, FlowError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(FlowError::NotInitialized);
        }
        let token = state
            .staged
            .clone()
            .ok_or_else(|| FlowError::UserCancelled(request.mode))?;

        let claims = SourceClaims::decode(&token).map_err(FlowError::Provider)?;
        let now = Utc::now();
        if claims.expires_at <= now {
            return Err(FlowError::Provider("source token has expired".to_string()));
        }
        if claims.not_before.is_some_and(|nbf| nbf > now) {
            return Err(FlowError::Provider("source token is not valid yet".to_string()));
        }

        let entry = CachedEntry {
            account: claims.account(),
            id_token: Token::new(token, Some(claims.expires_at)),
        };
        upsert(&mut state.cache, entry.clone());
        Ok(AuthenticationResult {
            account: entry.account,
            id_token: entry.id_token,
            scopes: request.scopes.clone(),
        })
    }
}

/// Replace the entry for the same identity or append a new one
fn upsert(cache: &mut Vec<CachedEntry>, entry: CachedEntry) {
    match cache
        .iter_mut()
        .find(|cached| cached.account.is_same_identity(&entry.account))
    {
        Some(cached) => *cached = entry,
        None => cache.push(entry),
    }
}

#[async_trait]
impl CredentialProvider for LocalTokenProvider {
    async fn initialize(&self) -> Result<(), InitError> {
        let mut state = self.state.lock();
        if state.initialized {
            return Ok(());
        }

        let seeded = std::mem::take(&mut state.seeded);
        for token in seeded {
            let entry = CachedEntry::from_source(&token)
                .map_err(|e| InitError::Misconfigured(format!("cached source token: {e}")))?;
            upsert(&mut state.cache, entry);
        }
        state.initialized = true;
        debug!("Local provider ready with {} cached account(s)", state.cache.len());
        Ok(())
    }

    async fn consume_redirect_result(&self) -> Result<Option<AuthenticationResult>, FlowError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(FlowError::NotInitialized);
        }
        Ok(state.pending_redirect.take())
    }

    async fn acquire_token_silently(&self, request: &SilentRequest) -> Result<Token, SilentAuthError> {
        let state = self.state.lock();
        if !state.initialized {
            return Err(SilentAuthError::NotInitialized);
        }
        let entry = state
            .cache
            .iter()
            .find(|cached| cached.account.is_same_identity(&request.account))
            .ok_or_else(|| {
                SilentAuthError::InteractionRequired("no cached token for account".to_string())
            })?;
        if entry.id_token.is_expired() {
            return Err(SilentAuthError::TokenExpired);
        }
        Ok(entry.id_token.clone())
    }

    async fn run_interactive(
        &self,
        request: &InteractiveRequest,
    ) -> Result<Option<AuthenticationResult>, FlowError> {
        let result = self.issue(request)?;
        match request.mode {
            InteractionMode::Popup => Ok(Some(result)),
            InteractionMode::Redirect => {
                info!("Redirect sign-in issued, result pending for the next load");
                self.state.lock().pending_redirect = Some(result);
                Ok(None)
            }
        }
    }

    fn list_cached_accounts(&self) -> Vec<Account> {
        self.state
            .lock()
            .cache
            .iter()
            .map(|entry| entry.account.clone())
            .collect()
    }

    async fn end_session(&self, account: Option<Account>) -> Result<(), FlowError> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(FlowError::NotInitialized);
        }
        match account {
            Some(account) => state
                .cache
                .retain(|entry| !entry.account.is_same_identity(&account)),
            None => state.cache.clear(),
        }
        Ok(())
    }
}
