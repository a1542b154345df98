//! Session observers
//!
//! Observers are told when the session signs in or out, typically to update
//! whatever the user is looking at. Notification is synchronous and
//! infallible; an observer that needs to do slow work should hand the change
//! off (see [`ChannelObserver`]).

use super::types::Account;
use tokio::sync::mpsc;
use tracing::debug;

/// A session transition worth presenting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Account),
    SignedOut,
}

/// Notification sink for session transitions
pub trait SessionObserver: Send + Sync {
    /// Must not panic and must return promptly
    fn on_session_change(&self, change: SessionChange);
}

/// Observer that ignores every change
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_session_change(&self, _change: SessionChange) {}
}

/// Forwards changes to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionChange>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionObserver for ChannelObserver {
    fn on_session_change(&self, change: SessionChange) {
        // Receiver gone means nobody is presenting anymore
        if self.tx.send(change).is_err() {
            debug!("Session change dropped, receiver closed");
        }
    }
}
