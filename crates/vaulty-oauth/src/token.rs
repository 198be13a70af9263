//! `OAuth2` token types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// `OAuth2` access token with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Access token string.
    pub access_token: String,
    /// Token type (usually "bearer").
    pub token_type: String,
    /// Expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope granted by the authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Provider account the token belongs to, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at: None,
            refresh_token: None,
            scope: None,
            account_id: None,
        }
    }

    /// Creates a token from a token endpoint response.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            scope: response.scope,
            account_id: response.account_id,
        }
    }

    /// Checks if the token is expired (with 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default)]
    pub expires_in: Option<u32>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Scope.
    #[serde(default)]
    pub scope: Option<String>,
    /// Account identifier (Dropbox).
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Error response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dropbox_response() {
        let response: TokenResponse = serde_json::from_str(
            r#"{
                "access_token": "sl.abc",
                "token_type": "bearer",
                "expires_in": 14400,
                "refresh_token": "r.def",
                "scope": "account_info.read",
                "account_id": "dbid:AAH4f99",
                "uid": "12345"
            }"#,
        )
        .unwrap();

        let token = Token::from_response(response);
        assert_eq!(token.access_token, "sl.abc");
        assert_eq!(token.account_id.as_deref(), Some("dbid:AAH4f99"));
        assert_eq!(token.refresh_token.as_deref(), Some("r.def"));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expiry_buffer() {
        let soon = Token::new("a", "bearer").with_expires_at(Utc::now() + Duration::seconds(30));
        assert!(soon.is_expired());
        assert!(!Token::new("a", "bearer").is_expired());
    }

    #[test]
    fn test_error_response() {
        let response: ErrorResponse =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"code doesn't exist"}"#)
                .unwrap();
        let err = response.into_error();
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
    }
}
