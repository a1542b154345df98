//! Credential provider implementations

pub mod local;

pub use local::{mint_source_token, LocalTokenProvider};
