//! Application state and server construction.

use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use vaulty_core::Database;
use vaulty_oauth::{DropboxApi, OAuthClient, Provider};

use crate::config::{AdminConfig, Config, ConfigError, DropboxConfig};
use crate::mailer::Mailer;
use crate::routes;

/// Dropbox application used for social login.
#[derive(Debug, Clone)]
pub struct DropboxLogin {
    /// Authorization code flow client.
    pub client: OAuthClient,
    /// Account API client.
    pub api: DropboxApi,
}

impl DropboxLogin {
    /// Pairs an OAuth client with an API client.
    #[must_use]
    pub const fn new(client: OAuthClient, api: DropboxApi) -> Self {
        Self { client, api }
    }

    /// Builds the login from configuration, or `None` when not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider endpoints cannot be parsed.
    pub fn from_config(config: &DropboxConfig) -> vaulty_oauth::Result<Option<Self>> {
        let (Some(client_id), Some(redirect_uri)) = (&config.client_id, &config.redirect_uri)
        else {
            return Ok(None);
        };

        let mut client =
            OAuthClient::new(client_id, Provider::dropbox()?).with_redirect_uri(redirect_uri);
        if let Some(secret) = &config.client_secret {
            client = client.with_client_secret(secret);
        }

        Ok(Some(Self::new(client, DropboxApi::new()?)))
    }
}

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Confirmation mail delivery.
    pub mailer: Mailer,
    /// Admin console login.
    pub admin: AdminConfig,
    /// Social login, when configured.
    pub dropbox: Option<DropboxLogin>,
    /// Whether cookies carry the `Secure` flag.
    pub secure_cookies: bool,
}

impl AppState {
    /// Builds the state from configuration and an open database.
    ///
    /// # Errors
    ///
    /// Returns an error if the mail or Dropbox settings are invalid.
    pub fn from_config(config: &Config, db: Database) -> Result<Self, ConfigError> {
        Ok(Self {
            db,
            mailer: Mailer::from_config(&config.mail)?,
            admin: config.admin.clone(),
            dropbox: DropboxLogin::from_config(&config.dropbox)?,
            secure_cookies: config.is_prod,
        })
    }
}

/// Starts serving on an already-bound listener.
///
/// # Errors
///
/// Returns an error if the listener cannot be handed to the server.
pub fn run(listener: TcpListener, state: AppState) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
