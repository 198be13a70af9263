//! Dropbox account API.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::token::Token;

const API_BASE: &str = "https://api.dropboxapi.com/2/";

/// Display name block of a Dropbox account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountName {
    /// Name as shown in the Dropbox UI.
    pub display_name: String,
}

/// The account an access token belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct DropboxAccount {
    /// Stable account ID (`dbid:...`).
    pub account_id: String,
    /// Account email.
    pub email: String,
    /// Whether Dropbox has verified the email.
    #[serde(default)]
    pub email_verified: bool,
    /// Account name.
    pub name: AccountName,
}

/// Minimal Dropbox API v2 client.
#[derive(Debug, Clone)]
pub struct DropboxApi {
    base: Url,
    http_client: Client,
}

impl DropboxApi {
    /// Creates a client for the public Dropbox API.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn new() -> Result<Self> {
        Self::with_base_url(API_BASE)
    }

    /// Creates a client against another API root.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not a valid URL.
    pub fn with_base_url(base: impl AsRef<str>) -> Result<Self> {
        let mut base = Url::parse(base.as_ref())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            http_client: Client::new(),
        })
    }

    /// Looks up the account that owns `token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if Dropbox rejects the call.
    pub async fn current_account(&self, token: &Token) -> Result<DropboxAccount> {
        let url = self.base.join("users/get_current_account")?;

        // RPC endpoints without arguments take a JSON null body
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("null")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "dropbox account lookup failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = DropboxApi::with_base_url("http://127.0.0.1:9/2").unwrap();
        assert_eq!(
            api.base.join("users/get_current_account").unwrap().as_str(),
            "http://127.0.0.1:9/2/users/get_current_account"
        );
    }

    #[test]
    fn test_account_deserialize() {
        let account: DropboxAccount = serde_json::from_str(
            r#"{
                "account_id": "dbid:AAH4f99",
                "name": {"given_name": "Franz", "surname": "Ferdinand",
                         "familiar_name": "Franz", "display_name": "Franz Ferdinand (Personal)",
                         "abbreviated_name": "FF"},
                "email": "franz@dropbox.com",
                "email_verified": true,
                "disabled": false
            }"#,
        )
        .unwrap();
        assert_eq!(account.account_id, "dbid:AAH4f99");
        assert_eq!(account.name.display_name, "Franz Ferdinand (Personal)");
        assert!(account.email_verified);
    }
}
