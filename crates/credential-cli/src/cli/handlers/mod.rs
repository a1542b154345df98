//! Command handlers for the credential CLI

pub mod config;
pub mod credentials;
pub mod session;
