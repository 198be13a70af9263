//! `OAuth2` provider endpoints.

use url::Url;

use crate::error::Result;

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name, also used as the stored social-auth provider key.
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
    /// Extra authorization URL parameters.
    pub auth_params: Vec<(String, String)>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
            auth_params: Vec::new(),
        })
    }

    /// Adds an authorization URL parameter.
    #[must_use]
    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.push((key.into(), value.into()));
        self
    }

    /// Dropbox.
    ///
    /// Requests offline access so a refresh token is issued; scopes are
    /// whatever the app was granted in the Dropbox console.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn dropbox() -> Result<Self> {
        Ok(Self::new(
            "dropbox",
            "https://www.dropbox.com/oauth2/authorize",
            "https://api.dropboxapi.com/oauth2/token",
        )?
        .with_auth_param("token_access_type", "offline"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dropbox_endpoints() {
        let provider = Provider::dropbox().unwrap();
        assert_eq!(provider.name, "dropbox");
        assert_eq!(provider.auth_url.host_str(), Some("www.dropbox.com"));
        assert_eq!(provider.token_url.path(), "/oauth2/token");
        assert!(provider.default_scopes.is_empty());
    }

    #[test]
    fn test_invalid_url() {
        assert!(Provider::new("bad", "not a url", "https://example.com/token").is_err());
    }
}
