//! Configuration for the credential session workspace
//!
//! Values are layered with figment: built-in defaults, then a TOML file,
//! then `CREDENTIAL_`-prefixed environment variables (nested keys separated
//! by `__`, e.g. `CREDENTIAL_API__BASE_URL`).

use crate::constants::{DEFAULT_API_URL, DEFAULT_CONFIG_FILE, DEFAULT_TIMEOUT_SECS, ENV_PREFIX};
use crate::types::LogLevel;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Layered sources could not be merged or deserialized
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A value parsed but is not usable
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Identity provider registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Application (client) ID registered with the identity provider
    pub client_id: String,

    /// Authority URL, including the sign-in policy where the provider needs one
    pub authority: String,

    /// Page a redirect flow returns to
    pub redirect_uri: String,

    /// Scopes requested on sign-in and silent token acquisition
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: "local-dev".to_string(),
            authority: "https://login.local.invalid/local-dev".to_string(),
            redirect_uri: "http://localhost:3000/".to_string(),
            scopes: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// `redirect_uri` as a URL
    pub fn redirect_start_page(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.redirect_uri).map_err(|e| ConfigError::InvalidValue {
            key: "auth.redirect_uri".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Session diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Least severe event level that is forwarded
    pub level: LogLevel,

    /// Forward events flagged as containing personal data
    pub pii_logging_enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Verbose,
            pii_logging_enabled: false,
        }
    }
}

/// Credential service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Local development sign-in using pre-issued source tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAuthConfig {
    /// Source token handed out by the next interactive sign-in.
    /// When unset, one is minted for `user_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_token: Option<String>,

    pub user_id: String,
    pub username: String,
    pub token_ttl_secs: u64,
}

impl ApiConfig {
    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LocalAuthConfig {
    fn default() -> Self {
        Self {
            source_token: None,
            user_id: "test123".to_string(),
            username: "test123@local.invalid".to_string(),
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl LocalAuthConfig {
    /// Lifetime of minted source tokens
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub auth: AuthConfig,
    pub logger: LoggerConfig,
    pub api: ApiConfig,
    pub local: LocalAuthConfig,
}

impl Config {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `credential.toml` in the working directory
    /// is used when present.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!("Loading configuration from: {}", path.display());

        let config: Config = Self::figment(&path).extract().map_err(|e| ConfigError::ParseError {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "auth.client_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.auth.authority.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "auth.authority".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        self.auth.redirect_start_page()?;
        Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".to_string(),
            reason: e.to_string(),
        })?;
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Generate example configuration file
    pub fn generate_example() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}
