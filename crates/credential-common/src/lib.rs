//! Shared building blocks for the credential session workspace
//!
//! Configuration loading, logging initialization and the constants both the
//! SDK and the command-line front end agree on.

pub mod config;
pub mod constants;
pub mod logging;
pub mod types;

pub use config::{ApiConfig, AuthConfig, Config, ConfigError, LocalAuthConfig, LoggerConfig};
pub use constants::*;
pub use types::LogLevel;
