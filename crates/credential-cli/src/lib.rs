//! Command-line front end for the credential service
//!
//! Drives the session manager against the local development provider and
//! talks to the credential service configured in `credential.toml`.

pub mod cli;
pub mod error;
pub mod observer;

pub use error::{CliError, Result};
