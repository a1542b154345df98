//! Session state and its owning context
//!
//! [`Session`] can only change through the transition methods below, which
//! keep `active_account` set exactly when the state is `Authenticated`.
//! [`SessionContext`] owns the one session of a context for its whole
//! lifetime and publishes every change to subscribers.

use super::types::{Account, InteractionMode};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    SigningOut,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::SigningOut => "signing out",
        };
        f.write_str(name)
    }
}

/// Where the context is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Created, `load()` not called yet
    Created,
    Initializing,
    Ready,
    /// Provider initialization failed; nothing else will work
    Failed,
    /// Navigated away; nothing else will run in this context
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    state: SessionState,
    active_account: Option<Account>,
    pending_flow: Option<InteractionMode>,
    /// Bumped on every transition, lets in-flight flows detect interference
    #[serde(skip)]
    epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            active_account: None,
            pending_flow: None,
            epoch: 0,
        }
    }
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.active_account.as_ref()
    }

    pub fn pending_flow(&self) -> Option<InteractionMode> {
        self.pending_flow
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn authenticate(&mut self, account: Account) {
        self.set(SessionState::Authenticated, Some(account), None);
    }

    /// Enter `Authenticating` and return the epoch the flow started at
    pub(crate) fn begin_interactive(&mut self, mode: InteractionMode) -> u64 {
        self.set(SessionState::Authenticating, None, Some(mode));
        self.epoch
    }

    pub(crate) fn begin_sign_out(&mut self) {
        self.set(SessionState::SigningOut, None, None);
    }

    pub(crate) fn unauthenticate(&mut self) {
        self.set(SessionState::Unauthenticated, None, None);
    }

    /// Roll back to a state captured before a failed transition
    pub(crate) fn restore(&mut self, previous: Session) {
        let epoch = self.epoch + 1;
        *self = previous;
        self.epoch = epoch;
    }

    fn set(
        &mut self,
        state: SessionState,
        active_account: Option<Account>,
        pending_flow: Option<InteractionMode>,
    ) {
        debug_assert_eq!(active_account.is_some(), state == SessionState::Authenticated);
        self.state = state;
        self.active_account = active_account;
        self.pending_flow = pending_flow;
        self.epoch += 1;
    }
}

struct ContextState {
    session: Session,
    lifecycle: Lifecycle,
}

/// Owner of the single session of a context
///
/// The lock is never held across an await.
pub(crate) struct SessionContext {
    inner: Mutex<ContextState>,
    updates: watch::Sender<Session>,
}

impl SessionContext {
    pub(crate) fn create() -> Self {
        let (updates, _) = watch::channel(Session::default());
        Self {
            inner: Mutex::new(ContextState {
                session: Session::default(),
                lifecycle: Lifecycle::Created,
            }),
            updates,
        }
    }

    pub(crate) fn snapshot(&self) -> Session {
        self.inner.lock().session.clone()
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().lifecycle
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.inner.lock().lifecycle = lifecycle;
    }

    /// Move from `from` to `to` if the context is at `from`; returns the
    /// lifecycle found before the attempt
    pub(crate) fn advance_lifecycle(&self, from: Lifecycle, to: Lifecycle) -> Lifecycle {
        let mut inner = self.inner.lock();
        let found = inner.lifecycle;
        if found == from {
            inner.lifecycle = to;
        }
        found
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Session> {
        self.updates.subscribe()
    }

    /// Run `f` against the session and publish the result if it changed
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Session, Lifecycle) -> R) -> R {
        let (result, changed) = {
            let mut inner = self.inner.lock();
            let lifecycle = inner.lifecycle;
            let before = inner.session.epoch();
            let result = f(&mut inner.session, lifecycle);
            let changed = (inner.session.epoch() != before).then(|| inner.session.clone());
            (result, changed)
        };
        if let Some(session) = changed {
            self.updates.send_replace(session);
        }
        result
    }

    /// The context navigated away; later operations are refused
    pub(crate) fn teardown(&self) {
        self.set_lifecycle(Lifecycle::TornDown);
    }
}
