//! Session management for the credential service front end
//!
//! This module provides:
//! - The credential provider boundary and a local development provider
//! - Active account resolution
//! - The session state machine and its owning context
//! - Session observers and structured diagnostics

pub mod events;
pub mod manager;
pub mod observer;
pub mod provider;
pub mod providers;
pub mod resolver;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use events::{ChannelEventSink, EventSink, SessionEvent, TracingEventSink};
pub use manager::{SessionManager, SessionManagerBuilder, SignInOutcome};
pub use observer::{ChannelObserver, NoopObserver, SessionChange, SessionObserver};
pub use provider::CredentialProvider;
pub use providers::{mint_source_token, LocalTokenProvider};
pub use resolver::{resolve_account, AccountResolver, FirstAccountResolver};
pub use session::{Lifecycle, Session, SessionState};
pub use types::{
    Account, AuthenticationResult, CacheLookupPolicy, FlowError, InitError, InteractionMode,
    InteractiveRequest, SessionError, SessionResult, SilentAuthError, SilentRequest, Token,
};
