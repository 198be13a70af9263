//! Server configuration.
//!
//! Settings are read from a JSON file and then overridden by `VAULTY_WEB_*`
//! environment variables. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vaulty_smtp::{Security, SmtpSettings};

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "VAULTY_WEB_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Config`].
    #[error("invalid settings file {path}: {source}")]
    Json {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The Dropbox provider could not be set up.
    #[error("invalid Dropbox configuration: {0}")]
    Dropbox(#[from] vaulty_oauth::Error),

    /// A setting could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Full variable name.
        name: String,
        /// Rejected value.
        value: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Production mode; marks cookies secure.
    pub is_prod: bool,
    /// Admin console login.
    pub admin: AdminConfig,
    /// Outgoing mail.
    pub mail: MailConfig,
    /// Dropbox application used by social login.
    pub dropbox: DropboxConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: default_data_dir().join("vaulty.db"),
            is_prod: false,
            admin: AdminConfig::default(),
            mail: MailConfig::default(),
            dropbox: DropboxConfig::default(),
        }
    }
}

/// Admin console credentials. With no password set, the console refuses everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Username.
    pub username: String,
    /// Password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
        }
    }
}

/// SMTP submission settings for confirmation mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Server host. Mail is only logged while unset.
    pub host: Option<String>,
    /// Server port.
    pub port: u16,
    /// `none`, `starttls` or `tls`.
    pub security: String,
    /// Login name.
    pub username: Option<String>,
    /// Login password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender address.
    pub from: String,
    /// Seconds allowed for connecting, and again for the whole exchange.
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            security: "starttls".to_string(),
            username: None,
            password: None,
            from: "noreply@vaulty.net".to_string(),
            timeout_secs: 15,
        }
    }
}

impl MailConfig {
    /// Builds SMTP settings, or `None` when no host is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown security mode.
    pub fn smtp_settings(&self) -> Result<Option<SmtpSettings>, ConfigError> {
        let Some(host) = self.host.as_deref() else {
            return Ok(None);
        };
        let security =
            Security::parse(&self.security).ok_or_else(|| ConfigError::InvalidValue {
                name: "mail.security".to_string(),
                value: self.security.clone(),
            })?;
        let timeout = Duration::from_secs(self.timeout_secs);
        let settings = SmtpSettings::new(host, self.port, security).with_timeouts(timeout, timeout);

        Ok(Some(match (&self.username, &self.password) {
            (Some(user), Some(pass)) => settings.with_credentials(user, pass),
            _ => settings,
        }))
    }
}

/// Dropbox application registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DropboxConfig {
    /// App key.
    pub client_id: Option<String>,
    /// App secret.
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    /// Redirect URI registered with Dropbox.
    pub redirect_uri: Option<String>,
}

impl Config {
    /// Loads the settings file named by `VAULTY_WEB_CONFIG` (or the default
    /// location) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// an override has an invalid value.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(format!("{ENV_PREFIX}CONFIG"))
            .map_or_else(default_config_path, PathBuf::from);

        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads a settings file; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `VAULTY_WEB_*` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable numbers or flags.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            self.port = parse_port("PORT", port)?;
        }
        if let Some(path) = get("DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(flag) = get("IS_PROD") {
            self.is_prod = parse_flag("IS_PROD", flag)?;
        }

        if let Some(user) = get("ADMIN_USER") {
            self.admin.username = user;
        }
        if let Some(pass) = get("ADMIN_PASS") {
            self.admin.password = Some(pass);
        }

        if let Some(host) = get("MAIL_HOST") {
            self.mail.host = Some(host);
        }
        if let Some(port) = get("MAIL_PORT") {
            self.mail.port = parse_port("MAIL_PORT", port)?;
        }
        if let Some(security) = get("MAIL_SECURITY") {
            if Security::parse(&security).is_none() {
                return Err(ConfigError::InvalidValue {
                    name: format!("{ENV_PREFIX}MAIL_SECURITY"),
                    value: security,
                });
            }
            self.mail.security = security;
        }
        if let Some(user) = get("MAIL_USER") {
            self.mail.username = Some(user);
        }
        if let Some(pass) = get("MAIL_PASSWORD") {
            self.mail.password = Some(pass);
        }
        if let Some(from) = get("MAIL_FROM") {
            self.mail.from = from;
        }

        if let Some(id) = get("DROPBOX_CLIENT_ID") {
            self.dropbox.client_id = Some(id);
        }
        if let Some(secret) = get("DROPBOX_CLIENT_SECRET") {
            self.dropbox.client_secret = Some(secret);
        }
        if let Some(uri) = get("DROPBOX_REDIRECT_URI") {
            self.dropbox.redirect_uri = Some(uri);
        }

        Ok(())
    }

    /// Returns the `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vaulty")
        .join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vaulty")
}

fn parse_port(key: &str, value: String) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: format!("{ENV_PREFIX}{key}"),
        value,
    })
}

fn parse_flag(key: &str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: format!("{ENV_PREFIX}{key}"),
            value,
        }),
    }
}
