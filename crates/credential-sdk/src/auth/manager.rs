//! Session lifecycle state machine
//!
//! The SessionManager decides which authentication flow to run, resolves the
//! active account, hands out tokens acquired silently and drives sign-out.
//! It never escalates a silent failure to an interactive flow on its own;
//! callers decide whether to prompt the user again.

use super::events::{EventSink, SessionEvent, TracingEventSink};
use super::observer::{NoopObserver, SessionChange, SessionObserver};
use super::provider::CredentialProvider;
use super::resolver::{AccountResolver, FirstAccountResolver};
use super::session::{Lifecycle, Session, SessionContext, SessionState};
use super::types::{
    Account, CacheLookupPolicy, FlowError, InteractionMode, InteractiveRequest, SessionError,
    SessionResult, SilentAuthError, SilentRequest, Token,
};
use credential_common::{AuthConfig, ConfigError, LogLevel};
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

/// What a `sign_in` call ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Popup flow completed
    SignedIn(Account),
    /// Already authenticated; no flow was started
    AlreadySignedIn(Account),
    /// Redirect flow started; the context is navigating away
    Redirecting,
    /// Another flow or a sign-out is in progress; the call was ignored
    InProgress,
}

enum SignInStart {
    Begin { previous: Session, epoch: u64 },
    AlreadySignedIn(Account),
    Busy,
}

/// Drives the session through its states
pub struct SessionManager {
    provider: Arc<dyn CredentialProvider>,
    resolver: Arc<dyn AccountResolver>,
    observer: Arc<dyn SessionObserver>,
    events: Arc<dyn EventSink>,
    context: SessionContext,
    scopes: Vec<String>,
    redirect_start_page: Option<Url>,
}

impl SessionManager {
    /// Create a manager with the default resolver, no observer and tracing diagnostics
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self::builder(provider).build()
    }

    pub fn builder(provider: Arc<dyn CredentialProvider>) -> SessionManagerBuilder {
        SessionManagerBuilder::new(provider)
    }

    /// Initialize the provider and establish the session for this context
    ///
    /// A pending redirect result takes precedence over cached accounts.
    /// Calling `load` again after it succeeded is a no-op; calling it while
    /// the first call is still running returns `NotLoaded`.
    pub async fn load(&self) -> SessionResult<Session> {
        match self
            .context
            .advance_lifecycle(Lifecycle::Created, Lifecycle::Initializing)
        {
            Lifecycle::Created => {}
            Lifecycle::Failed => return Err(SessionError::ProviderUnavailable),
            Lifecycle::TornDown => return Err(SessionError::TornDown),
            Lifecycle::Initializing => return Err(SessionError::NotLoaded),
            Lifecycle::Ready => {
                self.emit(SessionEvent::new(
                    LogLevel::Warning,
                    "Session already loaded, keeping current state",
                ));
                return Ok(self.snapshot());
            }
        }

        if let Err(e) = self.provider.initialize().await {
            self.context.set_lifecycle(Lifecycle::Failed);
            self.emit(SessionEvent::new(
                LogLevel::Error,
                format!("Credential provider failed to initialize: {e}"),
            ));
            return Err(e.into());
        }

        let redirect = match self.provider.consume_redirect_result().await {
            Ok(redirect) => redirect,
            Err(e) => {
                // The provider works; the user can still sign in again
                self.context.set_lifecycle(Lifecycle::Ready);
                self.emit(SessionEvent::new(
                    LogLevel::Warning,
                    format!("Failed to handle redirect result: {e}"),
                ));
                return Err(e.into());
            }
        };

        let account = match redirect {
            Some(result) => {
                self.emit(SessionEvent::new(LogLevel::Info, "Resumed redirect sign-in"));
                Some(result.account)
            }
            None => self.resolve_cached_account(),
        };

        if let Some(account) = account {
            self.context.update(|session, _| session.authenticate(account.clone()));
            self.announce_sign_in(account);
        }

        self.context.set_lifecycle(Lifecycle::Ready);
        Ok(self.snapshot())
    }

    /// Start an interactive sign-in
    ///
    /// Ignored while another flow or a sign-out is in progress. On failure
    /// the session returns to where it was before the call.
    pub async fn sign_in(&self, mode: InteractionMode) -> SessionResult<SignInOutcome> {
        let start = self.context.update(|session, lifecycle| {
            Self::ensure_ready(lifecycle)?;
            let start = match session.state() {
                SessionState::Authenticated => match session.active_account() {
                    Some(account) => SignInStart::AlreadySignedIn(account.clone()),
                    None => SignInStart::Busy,
                },
                SessionState::Authenticating | SessionState::SigningOut => SignInStart::Busy,
                SessionState::Unauthenticated if session.pending_flow().is_some() => {
                    SignInStart::Busy
                }
                SessionState::Unauthenticated => {
                    let previous = session.clone();
                    let epoch = session.begin_interactive(mode);
                    SignInStart::Begin { previous, epoch }
                }
            };
            Ok::<_, SessionError>(start)
        })?;

        let (previous, epoch) = match start {
            SignInStart::Begin { previous, epoch } => (previous, epoch),
            SignInStart::AlreadySignedIn(account) => {
                return Ok(SignInOutcome::AlreadySignedIn(account));
            }
            SignInStart::Busy => {
                self.emit(SessionEvent::new(
                    LogLevel::Verbose,
                    format!("Ignoring {mode} sign-in, another transition is in progress"),
                ));
                return Ok(SignInOutcome::InProgress);
            }
        };

        self.emit(SessionEvent::new(
            LogLevel::Info,
            format!("Starting {mode} sign-in"),
        ));
        let request = self.interactive_request(mode);

        match (mode, self.provider.run_interactive(&request).await) {
            (InteractionMode::Redirect, Ok(_)) => {
                self.emit(SessionEvent::new(
                    LogLevel::Info,
                    "Navigating away for redirect sign-in",
                ));
                self.context.teardown();
                Ok(SignInOutcome::Redirecting)
            }
            (InteractionMode::Popup, Ok(Some(result))) => self.finish_popup(epoch, result.account),
            (InteractionMode::Popup, Ok(None)) => {
                self.abort_sign_in(previous, epoch, mode, FlowError::MissingResult)
            }
            (_, Err(e)) => self.abort_sign_in(previous, epoch, mode, e),
        }
    }

    /// Token for the active account, acquired without user interaction
    ///
    /// Returns `Ok(None)` without touching the provider unless the session is
    /// authenticated. Failures leave the session as it is.
    pub async fn get_token(&self) -> Result<Option<Token>, SilentAuthError> {
        let snapshot = self.snapshot();
        let account = match snapshot.active_account() {
            Some(account) if snapshot.is_authenticated() => account.clone(),
            _ => {
                self.emit(SessionEvent::new(
                    LogLevel::Verbose,
                    "No active account, skipping token acquisition",
                ));
                return Ok(None);
            }
        };

        let request = SilentRequest {
            account,
            scopes: self.scopes.clone(),
            cache_lookup_policy: CacheLookupPolicy::Default,
        };

        match self.provider.acquire_token_silently(&request).await {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                self.emit(SessionEvent::new(
                    LogLevel::Warning,
                    format!("Silent token acquisition failed: {e}"),
                ));
                Err(e)
            }
        }
    }

    /// End the session with the provider
    ///
    /// Clears any pending popup flow as well. On failure the session returns
    /// to where it was before the call, except that an interrupted popup
    /// leaves it unauthenticated.
    pub async fn sign_out(&self) -> SessionResult<()> {
        let begin = self.context.update(|session, lifecycle| {
            Self::ensure_ready(lifecycle)?;
            if session.state() == SessionState::SigningOut {
                return Ok(None);
            }
            let previous = session.clone();
            session.begin_sign_out();
            Ok::<_, SessionError>(Some(previous))
        })?;

        let Some(previous) = begin else {
            self.emit(SessionEvent::new(LogLevel::Verbose, "Sign-out already in progress"));
            return Ok(());
        };

        let account = previous.active_account().cloned();
        match self.provider.end_session(account).await {
            Ok(()) => {
                self.context.update(|session, _| session.unauthenticate());
                if previous.is_authenticated() {
                    self.emit(SessionEvent::new(LogLevel::Info, "Signed out"));
                    self.observer.on_session_change(SessionChange::SignedOut);
                }
                Ok(())
            }
            Err(e) => {
                // The interrupted popup can no longer commit, so there is
                // nothing to go back to
                self.context.update(|session, _| {
                    if previous.state() == SessionState::Authenticating {
                        session.unauthenticate();
                    } else {
                        session.restore(previous);
                    }
                });
                self.emit(SessionEvent::new(
                    LogLevel::Warning,
                    format!("Sign-out failed: {e}"),
                ));
                Err(e.into())
            }
        }
    }

    /// The context is navigating away; refuse further operations
    pub fn teardown(&self) {
        self.context.teardown();
    }

    /// Current session
    pub fn snapshot(&self) -> Session {
        self.context.snapshot()
    }

    /// Stream of session changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.context.subscribe()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.context.lifecycle()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn active_account(&self) -> Option<Account> {
        self.snapshot().active_account().cloned()
    }

    fn ensure_ready(lifecycle: Lifecycle) -> SessionResult<()> {
        match lifecycle {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Created | Lifecycle::Initializing => Err(SessionError::NotLoaded),
            Lifecycle::Failed => Err(SessionError::ProviderUnavailable),
            Lifecycle::TornDown => Err(SessionError::TornDown),
        }
    }

    fn resolve_cached_account(&self) -> Option<Account> {
        let accounts = self.provider.list_cached_accounts();
        match accounts.len() {
            0 => self.emit(SessionEvent::new(LogLevel::Verbose, "No cached accounts")),
            1 => {}
            n => self.emit(SessionEvent::new(
                LogLevel::Warning,
                format!("{n} cached accounts detected, using the first one"),
            )),
        }
        self.resolver.resolve(accounts)
    }

    fn finish_popup(&self, epoch: u64, account: Account) -> SessionResult<SignInOutcome> {
        let committed = self.context.update(|session, _| {
            if session.epoch() != epoch {
                return false;
            }
            session.authenticate(account.clone());
            true
        });

        if !committed {
            self.emit(SessionEvent::new(
                LogLevel::Warning,
                "Discarding popup result, the session changed while it was open",
            ));
            return Err(SessionError::Interrupted);
        }

        self.announce_sign_in(account.clone());
        Ok(SignInOutcome::SignedIn(account))
    }

    fn abort_sign_in(
        &self,
        previous: Session,
        epoch: u64,
        mode: InteractionMode,
        error: FlowError,
    ) -> SessionResult<SignInOutcome> {
        self.context.update(|session, _| {
            if session.epoch() == epoch {
                session.restore(previous);
            }
        });
        self.emit(SessionEvent::new(
            LogLevel::Warning,
            format!("{mode} sign-in failed: {error}"),
        ));
        Err(error.into())
    }

    fn announce_sign_in(&self, account: Account) {
        self.emit(
            SessionEvent::new(LogLevel::Info, format!("Signed in as {}", account.username)).pii(),
        );
        self.observer.on_session_change(SessionChange::SignedIn(account));
    }

    fn interactive_request(&self, mode: InteractionMode) -> InteractiveRequest {
        InteractiveRequest {
            mode,
            scopes: self.scopes.clone(),
            redirect_start_page: match mode {
                InteractionMode::Redirect => self.redirect_start_page.clone(),
                InteractionMode::Popup => None,
            },
        }
    }

    fn emit(&self, event: SessionEvent) {
        self.events.emit(event);
    }
}

/// Builder for constructing a SessionManager with custom collaborators
pub struct SessionManagerBuilder {
    provider: Arc<dyn CredentialProvider>,
    resolver: Option<Arc<dyn AccountResolver>>,
    observer: Option<Arc<dyn SessionObserver>>,
    events: Option<Arc<dyn EventSink>>,
    scopes: Vec<String>,
    redirect_start_page: Option<Url>,
}

impl SessionManagerBuilder {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            resolver: None,
            observer: None,
            events: None,
            scopes: Vec::new(),
            redirect_start_page: None,
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn AccountResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Scopes requested on sign-in and silent acquisition
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Page a redirect flow returns to
    pub fn redirect_start_page(mut self, page: Url) -> Self {
        self.redirect_start_page = Some(page);
        self
    }

    /// Scopes and redirect start page from the `auth` config section
    pub fn auth_config(self, auth: &AuthConfig) -> Result<Self, ConfigError> {
        let page = auth.redirect_start_page()?;
        Ok(self.scopes(auth.scopes.clone()).redirect_start_page(page))
    }

    pub fn build(self) -> SessionManager {
        SessionManager {
            provider: self.provider,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(FirstAccountResolver)),
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
            events: self
                .events
                .unwrap_or_else(|| Arc::new(TracingEventSink::default())),
            context: SessionContext::create(),
            scopes: self.scopes,
            redirect_start_page: self.redirect_start_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::events::ChannelEventSink;
    use crate::auth::observer::ChannelObserver;
    use crate::auth::provider::MockCredentialProvider;
    use crate::auth::types::{AuthenticationResult, InitError};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn account(id: &str) -> Account {
        Account::new(format!("{id}.home"), id, format!("{id}@example.com"))
    }

    fn auth_result(account: Account) -> AuthenticationResult {
        AuthenticationResult {
            account,
            id_token: Token::new("id-token", None),
            scopes: vec![],
        }
    }

    /// Provider that loads cleanly with the given cache and no redirect result
    fn loading_provider(accounts: Vec<Account>) -> MockCredentialProvider {
        let mut provider = MockCredentialProvider::new();
        provider.expect_initialize().times(1).returning(|| Ok(()));
        provider
            .expect_consume_redirect_result()
            .times(1)
            .returning(|| Ok(None));
        provider.expect_list_cached_accounts().return_const(accounts);
        provider
    }

    fn manager_with_observer(
        provider: MockCredentialProvider,
    ) -> (SessionManager, UnboundedReceiver<SessionChange>) {
        let (observer, changes) = ChannelObserver::new();
        let manager = SessionManager::builder(Arc::new(provider))
            .observer(Arc::new(observer))
            .build();
        (manager, changes)
    }

    fn assert_invariant(manager: &SessionManager) {
        let session = manager.snapshot();
        assert_eq!(
            session.active_account().is_some(),
            session.state() == SessionState::Authenticated
        );
    }

    #[tokio::test]
    async fn test_load_without_accounts_stays_unauthenticated() {
        let (manager, mut changes) = manager_with_observer(loading_provider(vec![]));

        let session = manager.load().await.unwrap();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(manager.lifecycle(), Lifecycle::Ready);
        assert!(changes.try_recv().is_err());
        assert_invariant(&manager);
    }

    #[tokio::test]
    async fn test_load_with_cached_account_authenticates() {
        let (manager, mut changes) = manager_with_observer(loading_provider(vec![account("a")]));

        let session = manager.load().await.unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.active_account(), Some(&account("a")));
        assert_eq!(
            changes.try_recv().unwrap(),
            SessionChange::SignedIn(account("a"))
        );
        assert_invariant(&manager);
    }

    #[tokio::test]
    async fn test_redirect_result_takes_precedence_over_cache() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_initialize().returning(|| Ok(()));
        provider
            .expect_consume_redirect_result()
            .returning(|| Ok(Some(auth_result(account("redirected")))));
        provider.expect_list_cached_accounts().never();
        let (manager, mut changes) = manager_with_observer(provider);

        let session = manager.load().await.unwrap();

        assert_eq!(session.active_account(), Some(&account("redirected")));
        assert_eq!(
            changes.try_recv().unwrap(),
            SessionChange::SignedIn(account("redirected"))
        );
    }

    #[tokio::test]
    async fn test_multiple_cached_accounts_first_wins_with_warning() {
        let provider = loading_provider(vec![account("a"), account("b")]);
        let (events, mut rx) = ChannelEventSink::new();
        let manager = SessionManager::builder(Arc::new(provider))
            .event_sink(Arc::new(events))
            .build();

        manager.load().await.unwrap();

        assert_eq!(manager.active_account(), Some(account("a")));
        let mut warned = false;
        while let Ok(event) = rx.try_recv() {
            if event.level == LogLevel::Warning && event.message.contains("2 cached accounts") {
                warned = true;
            }
        }
        assert!(warned);
    }

    #[tokio::test]
    async fn test_sign_in_event_is_flagged_as_pii() {
        let provider = loading_provider(vec![account("a")]);
        let (events, mut rx) = ChannelEventSink::new();
        let manager = SessionManager::builder(Arc::new(provider))
            .event_sink(Arc::new(events))
            .build();

        manager.load().await.unwrap();

        let mut found = false;
        while let Ok(event) = rx.try_recv() {
            if event.message.contains("a@example.com") {
                assert!(event.contains_pii);
                found = true;
            }
        }
        assert!(found);
    }

    #[tokio::test]
    async fn test_get_token_unauthenticated_skips_provider() {
        let mut provider = loading_provider(vec![]);
        provider.expect_acquire_token_silently().never();
        let manager = SessionManager::new(Arc::new(provider));

        // Before load as well as after
        assert_eq!(manager.get_token().await.unwrap(), None);
        manager.load().await.unwrap();
        assert_eq!(manager.get_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_popup_sign_in_then_tokens() {
        let mut provider = loading_provider(vec![]);
        provider
            .expect_run_interactive()
            .withf(|request| request.mode == InteractionMode::Popup)
            .times(1)
            .returning(|_| Ok(Some(auth_result(account("u")))));
        let mut issued = 0;
        provider
            .expect_acquire_token_silently()
            .withf(|request| {
                request.account == account("u")
                    && request.cache_lookup_policy == CacheLookupPolicy::Default
            })
            .times(2)
            .returning(move |_| {
                issued += 1;
                Ok(Token::new(format!("token-{issued}"), None))
            });
        let (manager, mut changes) = manager_with_observer(provider);
        manager.load().await.unwrap();

        let outcome = manager.sign_in(InteractionMode::Popup).await.unwrap();

        assert_eq!(outcome, SignInOutcome::SignedIn(account("u")));
        assert_eq!(manager.active_account(), Some(account("u")));
        assert_eq!(changes.try_recv().unwrap(), SessionChange::SignedIn(account("u")));

        let first = manager.get_token().await.unwrap().unwrap();
        let second = manager.get_token().await.unwrap().unwrap();
        assert_eq!(first.secret(), "token-1");
        assert_eq!(second.secret(), "token-2");
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_silent_failure_does_not_escalate() {
        let mut provider = loading_provider(vec![account("a")]);
        provider.expect_run_interactive().never();
        provider
            .expect_acquire_token_silently()
            .times(1)
            .returning(|_| Err(SilentAuthError::InteractionRequired("no refresh token".into())));
        let (manager, _changes) = manager_with_observer(provider);
        manager.load().await.unwrap();

        let result = manager.get_token().await;

        assert!(matches!(result, Err(SilentAuthError::InteractionRequired(_))));
        assert_eq!(manager.snapshot().state(), SessionState::Authenticated);
        assert_eq!(manager.active_account(), Some(account("a")));
    }

    #[tokio::test]
    async fn test_popup_failure_rolls_back() {
        let mut provider = loading_provider(vec![]);
        provider
            .expect_run_interactive()
            .returning(|_| Err(FlowError::UserCancelled(InteractionMode::Popup)));
        let (manager, mut changes) = manager_with_observer(provider);
        manager.load().await.unwrap();
        let before = manager.snapshot();

        let result = manager.sign_in(InteractionMode::Popup).await;

        assert_eq!(
            result,
            Err(SessionError::Flow(FlowError::UserCancelled(InteractionMode::Popup)))
        );
        let after = manager.snapshot();
        assert_eq!(after.state(), before.state());
        assert_eq!(after.pending_flow(), None);
        assert!(changes.try_recv().is_err());
        assert_invariant(&manager);
    }

    #[tokio::test]
    async fn test_popup_without_result_is_a_flow_error() {
        let mut provider = loading_provider(vec![]);
        provider.expect_run_interactive().returning(|_| Ok(None));
        let manager = SessionManager::new(Arc::new(provider));
        manager.load().await.unwrap();

        let result = manager.sign_in(InteractionMode::Popup).await;

        assert_eq!(result, Err(SessionError::Flow(FlowError::MissingResult)));
        assert_eq!(manager.snapshot().state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_redirect_sign_in_tears_down_context() {
        let mut provider = loading_provider(vec![]);
        provider
            .expect_run_interactive()
            .withf(|request| {
                request.mode == InteractionMode::Redirect
                    && request.redirect_start_page.as_ref().map(Url::as_str)
                        == Some("http://localhost:3000/")
            })
            .times(1)
            .returning(|_| Ok(None));
        let manager = SessionManager::builder(Arc::new(provider))
            .redirect_start_page(Url::parse("http://localhost:3000/").unwrap())
            .build();
        manager.load().await.unwrap();

        let outcome = manager.sign_in(InteractionMode::Redirect).await.unwrap();

        assert_eq!(outcome, SignInOutcome::Redirecting);
        let session = manager.snapshot();
        assert_eq!(session.state(), SessionState::Authenticating);
        assert_eq!(session.pending_flow(), Some(InteractionMode::Redirect));
        assert_eq!(manager.lifecycle(), Lifecycle::TornDown);
        assert_eq!(
            manager.sign_in(InteractionMode::Popup).await,
            Err(SessionError::TornDown)
        );
        assert_invariant(&manager);
    }

    #[tokio::test]
    async fn test_auth_config_sets_scopes_and_redirect_page() {
        let mut provider = loading_provider(vec![]);
        provider
            .expect_run_interactive()
            .withf(|request| {
                request.scopes == vec!["openid".to_string()]
                    && request.redirect_start_page.as_ref().map(Url::as_str)
                        == Some("http://localhost:3000/callback")
            })
            .times(1)
            .returning(|_| Ok(None));
        let auth = AuthConfig {
            redirect_uri: "http://localhost:3000/callback".to_string(),
            scopes: vec!["openid".to_string()],
            ..AuthConfig::default()
        };
        let manager = SessionManager::builder(Arc::new(provider))
            .auth_config(&auth)
            .unwrap()
            .build();
        manager.load().await.unwrap();

        let outcome = manager.sign_in(InteractionMode::Redirect).await.unwrap();

        assert_eq!(outcome, SignInOutcome::Redirecting);
    }

    #[test]
    fn test_auth_config_rejects_relative_redirect() {
        let auth = AuthConfig {
            redirect_uri: "/callback".to_string(),
            ..AuthConfig::default()
        };
        let result = SessionManager::builder(Arc::new(MockCredentialProvider::new()))
            .auth_config(&auth);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "auth.redirect_uri"
        ));
    }

    #[tokio::test]
    async fn test_sign_in_while_authenticated_starts_no_flow() {
        let mut provider = loading_provider(vec![account("a")]);
        provider.expect_run_interactive().never();
        let manager = SessionManager::new(Arc::new(provider));
        manager.load().await.unwrap();

        let outcome = manager.sign_in(InteractionMode::Popup).await.unwrap();

        assert_eq!(outcome, SignInOutcome::AlreadySignedIn(account("a")));
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_and_notifies() {
        let mut provider = loading_provider(vec![account("a")]);
        provider
            .expect_end_session()
            .withf(|account_arg| account_arg.as_ref() == Some(&account("a")))
            .times(1)
            .returning(|_| Ok(()));
        let (manager, mut changes) = manager_with_observer(provider);
        manager.load().await.unwrap();
        let _ = changes.try_recv();

        manager.sign_out().await.unwrap();

        let session = manager.snapshot();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(session.active_account(), None);
        assert_eq!(changes.try_recv().unwrap(), SessionChange::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_out_when_unauthenticated_does_not_notify() {
        let mut provider = loading_provider(vec![]);
        provider
            .expect_end_session()
            .withf(|account_arg| account_arg.is_none())
            .returning(|_| Ok(()));
        let (manager, mut changes) = manager_with_observer(provider);
        manager.load().await.unwrap();

        manager.sign_out().await.unwrap();

        assert_eq!(manager.snapshot().state(), SessionState::Unauthenticated);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sign_out_failure_restores_session() {
        let mut provider = loading_provider(vec![account("a")]);
        provider
            .expect_end_session()
            .returning(|_| Err(FlowError::NetworkError("offline".into())));
        let (manager, mut changes) = manager_with_observer(provider);
        manager.load().await.unwrap();
        let _ = changes.try_recv();

        let result = manager.sign_out().await;

        assert!(matches!(result, Err(SessionError::Flow(FlowError::NetworkError(_)))));
        assert_eq!(manager.snapshot().state(), SessionState::Authenticated);
        assert_eq!(manager.active_account(), Some(account("a")));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_init_failure_is_fatal() {
        let mut provider = MockCredentialProvider::new();
        provider
            .expect_initialize()
            .times(1)
            .returning(|| Err(InitError::Misconfigured("missing client id".into())));
        provider.expect_consume_redirect_result().never();
        provider.expect_run_interactive().never();
        let manager = SessionManager::new(Arc::new(provider));

        let result = manager.load().await;

        assert!(matches!(result, Err(SessionError::Init(InitError::Misconfigured(_)))));
        assert_eq!(manager.lifecycle(), Lifecycle::Failed);
        assert_eq!(manager.load().await.unwrap_err(), SessionError::ProviderUnavailable);
        assert_eq!(
            manager.sign_in(InteractionMode::Popup).await,
            Err(SessionError::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_operations_before_load_are_refused() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_run_interactive().never();
        provider.expect_end_session().never();
        let manager = SessionManager::new(Arc::new(provider));

        assert_eq!(
            manager.sign_in(InteractionMode::Popup).await,
            Err(SessionError::NotLoaded)
        );
        assert_eq!(manager.sign_out().await, Err(SessionError::NotLoaded));
    }

    #[tokio::test]
    async fn test_second_load_is_a_no_op() {
        let provider = loading_provider(vec![account("a")]);
        let (manager, mut changes) = manager_with_observer(provider);

        manager.load().await.unwrap();
        let again = manager.load().await.unwrap();

        assert!(again.is_authenticated());
        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redirect_consumption_failure_leaves_session_usable() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_initialize().returning(|| Ok(()));
        provider
            .expect_consume_redirect_result()
            .returning(|| Err(FlowError::Provider("state mismatch".into())));
        provider.expect_list_cached_accounts().never();
        provider
            .expect_run_interactive()
            .returning(|_| Ok(Some(auth_result(account("retry")))));
        let manager = SessionManager::new(Arc::new(provider));

        assert!(matches!(
            manager.load().await,
            Err(SessionError::Flow(FlowError::Provider(_)))
        ));
        assert_eq!(manager.lifecycle(), Lifecycle::Ready);
        assert_eq!(manager.snapshot().state(), SessionState::Unauthenticated);

        let outcome = manager.sign_in(InteractionMode::Popup).await.unwrap();
        assert_eq!(outcome, SignInOutcome::SignedIn(account("retry")));
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let provider = loading_provider(vec![account("a")]);
        let manager = SessionManager::new(Arc::new(provider));
        let mut updates = manager.subscribe();

        manager.load().await.unwrap();

        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_authenticated());
    }
}
