//! Authorization code flow client.

use std::collections::HashMap;

use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::pkce::PkceChallenge;
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};

/// `OAuth2` client for one provider application.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI the provider sends the browser back to.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Builds the URL the browser is sent to for consent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no redirect URI is set.
    pub fn authorization_url(&self, state: &str, pkce: Option<&PkceChallenge>) -> Result<Url> {
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("redirect URI is required".into()))?;

        let mut url = self.provider.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.client_id);
            query.append_pair("redirect_uri", redirect_uri);
            query.append_pair("state", state);

            if !self.provider.default_scopes.is_empty() {
                query.append_pair("scope", &self.provider.default_scopes.join(" "));
            }

            if let Some(pkce) = pkce {
                query.append_pair("code_challenge", pkce.challenge());
                query.append_pair("code_challenge_method", pkce.method());
            }

            for (key, value) in &self.provider.auth_params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects the code.
    pub async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<Token> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.client_id.as_str());

        if let Some(uri) = &self.redirect_uri {
            params.insert("redirect_uri", uri);
        }
        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }
        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        tracing::debug!(provider = %self.provider.name, "exchanging authorization code");
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &HashMap<&str, &str>) -> Result<Token> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => error.into_error(),
                Err(_) => Error::Api {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let token_response: TokenResponse = serde_json::from_str(&body)?;
        Ok(Token::from_response(token_response))
    }
}
