//! Request and response types of the credential service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Long-lived API key issued in exchange for an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of `POST /credentials:check`
///
/// The service answers 200 even for invalid credentials; `valid` and
/// `failure_reason` carry the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCheck {
    pub valid: bool,
    #[serde(
        rename = "failureReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub failure_reason: Option<String>,
    #[serde(rename = "tokenID", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Credential presented to `POST /credentials:check`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as a bearer token with cookies omitted
    ApiKey(String),
    /// Whatever auth cookie the client's jar holds
    Cookie,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_check_field_names() {
        let check: CredentialCheck = serde_json::from_value(json!({
            "valid": true,
            "tokenID": "tok-1",
            "userID": "user-1",
        }))
        .unwrap();
        assert!(check.valid);
        assert_eq!(check.token_id.as_deref(), Some("tok-1"));
        assert_eq!(check.user_id.as_deref(), Some("user-1"));
        assert_eq!(check.failure_reason, None);

        let failed: CredentialCheck = serde_json::from_value(json!({
            "valid": false,
            "failureReason": "token expired",
        }))
        .unwrap();
        assert_eq!(failed.failure_reason.as_deref(), Some("token expired"));
    }

    #[test]
    fn test_api_key_expiry_is_optional() {
        let key: ApiKey = serde_json::from_value(json!({
            "id": "k1",
            "key": "secret",
            "expiresAt": "9999-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(key.expires_at.is_some());

        let key: ApiKey = serde_json::from_value(json!({ "id": "k2", "key": "s" })).unwrap();
        assert_eq!(key.expires_at, None);
    }
}
