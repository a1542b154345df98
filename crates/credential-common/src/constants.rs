//! Service constants shared by the SDK and the CLI
//!
//! These match the routes and defaults of the credential service the SDK
//! talks to.

/// Base URL of a locally running credential service
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default timeout in seconds for credential service requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the cookie the credential service issues on login
pub const AUTH_COOKIE_NAME: &str = "jwt";

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "credential.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CREDENTIAL_";

/// Claim marking a token as a local "source" token meant for exchange
pub const LOCAL_AUTH_CLAIM: &str = "local_auth";
