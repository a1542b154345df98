//! Structured diagnostics emitted by the session manager
//!
//! Every event carries a level and a flag marking whether the message
//! contains personal data (usernames, account ids). Sinks are injected into
//! the manager; [`TracingEventSink`] is the default.

use credential_common::{LoggerConfig, LogLevel};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub level: LogLevel,
    pub message: String,
    pub contains_pii: bool,
}

impl SessionEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            contains_pii: false,
        }
    }

    /// Same event, flagged as carrying personal data
    pub fn pii(mut self) -> Self {
        self.contains_pii = true;
        self
    }
}

/// Receives session diagnostics
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Forwards events to `tracing`, dropping PII unless enabled
#[derive(Debug, Clone)]
pub struct TracingEventSink {
    threshold: LogLevel,
    pii_enabled: bool,
}

impl TracingEventSink {
    pub fn new(threshold: LogLevel, pii_enabled: bool) -> Self {
        Self {
            threshold,
            pii_enabled,
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.level, config.pii_logging_enabled)
    }

    /// Whether `event` would be forwarded
    pub fn accepts(&self, event: &SessionEvent) -> bool {
        (!event.contains_pii || self.pii_enabled) && event.level.enabled_at(self.threshold)
    }
}

impl Default for TracingEventSink {
    fn default() -> Self {
        Self::from_config(&LoggerConfig::default())
    }
}

impl EventSink for TracingEventSink {
    fn emit(&self, event: SessionEvent) {
        if !self.accepts(&event) {
            return;
        }
        match event.level {
            LogLevel::Error => error!(target: "credential_sdk::session", "{}", event.message),
            LogLevel::Warning => warn!(target: "credential_sdk::session", "{}", event.message),
            LogLevel::Info => info!(target: "credential_sdk::session", "{}", event.message),
            LogLevel::Verbose => debug!(target: "credential_sdk::session", "{}", event.message),
            LogLevel::Trace => trace!(target: "credential_sdk::session", "{}", event.message),
        }
    }
}

/// Streams every event to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event dropped, receiver closed");
        }
    }
}
