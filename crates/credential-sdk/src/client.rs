//! HTTP client for the credential service
//!
//! The service exchanges identity tokens issued by the credential provider
//! for app-specific credentials: an auth cookie (`jwt`) for browser-style
//! sessions and long-lived API keys for programmatic use.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use credential_sdk::{ClientBuilder, Credential};
//!
//! # async fn example() -> credential_sdk::Result<()> {
//! let client = ClientBuilder::default()
//!     .base_url("http://localhost:8080")
//!     .build()?;
//!
//! let check = client
//!     .check_credentials(Credential::ApiKey("my-api-key".into()))
//!     .await?;
//! println!("valid: {}", check.valid);
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::Token,
    error::{ApiError, ErrorResponse, Result},
    types::{ApiKey, Credential, CredentialCheck},
};
use credential_common::{AUTH_COOKIE_NAME, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// HTTP client for the credential service
#[derive(Debug)]
pub struct CredentialServiceClient {
    /// Sends and stores cookies
    http_client: reqwest::Client,
    /// Never sends cookies; used when a bearer key must stand alone
    bare_client: reqwest::Client,
    cookies: Arc<Jar>,
    base_url: Url,
}

impl CredentialServiceClient {
    /// Create a new client (private - use ClientBuilder instead)
    fn new(base_url: Url, timeout: Duration, connect_timeout: Option<Duration>) -> Result<Self> {
        let cookies = Arc::new(Jar::default());

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&cookies));
        let mut bare_builder = reqwest::Client::builder().timeout(timeout);
        if let Some(connect_timeout) = connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
            bare_builder = bare_builder.connect_timeout(connect_timeout);
        }

        Ok(Self {
            http_client: builder.build().map_err(ApiError::HttpClient)?,
            bare_client: bare_builder.build().map_err(ApiError::HttpClient)?,
            cookies,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ===== Session cookie =====

    /// Exchange an identity token for the service's auth cookie
    pub async fn login(&self, id_token: &Token) -> Result<()> {
        let request = self
            .http_client
            .post(self.url("/login/cookie")?)
            .bearer_auth(id_token.secret());
        let response = request.send().await.map_err(ApiError::HttpClient)?;
        self.handle_empty_response(response).await?;
        info!("Logged in to credential service");
        Ok(())
    }

    /// Ask the service to clear its auth cookie
    pub async fn logout(&self) -> Result<()> {
        let request = self.http_client.post(self.url("/logout/cookie")?);
        let response = request.send().await.map_err(ApiError::HttpClient)?;
        self.handle_empty_response(response).await?;
        info!("Logged out of credential service");
        Ok(())
    }

    /// Whether the cookie jar currently holds a non-empty auth cookie for the service
    pub fn has_auth_cookie(&self) -> bool {
        let Some(header) = self.cookies.cookies(&self.base_url) else {
            return false;
        };
        let Ok(header) = header.to_str() else {
            return false;
        };
        header.split(';').any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, value)| name == AUTH_COOKIE_NAME && !value.is_empty())
        })
    }

    // ===== API keys =====

    /// Exchange an identity token for a long-lived API key
    pub async fn create_api_key(&self, id_token: &Token) -> Result<ApiKey> {
        let request = self
            .http_client
            .post(self.url("/login/apikey")?)
            .bearer_auth(id_token.secret());
        let response = request.send().await.map_err(ApiError::HttpClient)?;
        let key: ApiKey = self.handle_response(response).await?;
        info!("Issued API key {}", key.id);
        Ok(key)
    }

    // ===== Credential checks =====

    /// Ask the service whether a credential is usable
    pub async fn check_credentials(&self, credential: Credential) -> Result<CredentialCheck> {
        let url = self.url("/credentials:check")?;
        let request = match &credential {
            Credential::ApiKey(key) => {
                if key.trim().is_empty() {
                    return Err(ApiError::InvalidRequest {
                        message: "API key must not be empty".into(),
                    });
                }
                self.bare_client.post(url).bearer_auth(key)
            }
            Credential::Cookie => self.http_client.post(url),
        };

        let check: CredentialCheck = self.send(request).await?;
        debug!(
            "Credential check: valid={} reason={:?}",
            check.valid, check.failure_reason
        );
        Ok(check)
    }

    // ===== Private Helper Methods =====

    fn url(&self, path: &str) -> Result<Url> {
        // "./" keeps `credentials:check` from parsing as a scheme
        self.base_url
            .join(&format!("./{}", path.trim_start_matches('/')))
            .map_err(|e| ApiError::InvalidRequest {
                message: format!("Invalid path {path}: {e}"),
            })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(ApiError::HttpClient)?;
        self.handle_response(response).await
    }

    /// Handle a response carrying a JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        if !response.status().is_success() {
            return self.handle_error_response(response).await;
        }
        let body = response.text().await.map_err(ApiError::HttpClient)?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
            message: format!("Failed to parse response body: {e}"),
        })
    }

    /// Handle a response whose body is irrelevant
    async fn handle_empty_response(&self, response: Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        // Prefer the service's own message
        let message = serde_json::from_str::<ErrorResponse>(&error_text)
            .map(|e| e.message)
            .unwrap_or_else(|_| {
                if error_text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                } else {
                    error_text
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Authentication { message })
            }
            _ => Err(ApiError::Service {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// Builder for constructing a CredentialServiceClient with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Take base URL and timeout from the `api` config section
    pub fn from_config(config: &credential_common::ApiConfig) -> Self {
        Self::new()
            .base_url(config.base_url.clone())
            .timeout(config.request_timeout())
    }

    /// Build the client
    pub fn build(self) -> Result<CredentialServiceClient> {
        let raw = self.base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        // Relative joins need a trailing slash to keep any base path
        let normalized = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| ApiError::InvalidRequest {
            message: format!("Invalid base URL {normalized}: {e}"),
        })?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        CredentialServiceClient::new(base_url, timeout, self.connect_timeout)
    }
}
