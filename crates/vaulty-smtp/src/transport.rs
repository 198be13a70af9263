//! One-call message delivery over a configured submission server.

use std::time::Duration;

use tracing::{debug, info};

use crate::connection::{
    Authenticated, Client, Connected, MailTransaction, SmtpStream, connect, connect_tls,
};
use crate::error::{Error, Result};
use crate::message::{Address, Message};

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain TCP (local relays and tests).
    None,
    /// Plain TCP upgraded with STARTTLS (usually port 587).
    #[default]
    StartTls,
    /// Implicit TLS (usually port 465).
    Tls,
}

impl Security {
    /// Parses a mode name (`none`, `starttls`, `tls`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Some(Self::None),
            "starttls" => Some(Self::StartTls),
            "tls" | "ssl" => Some(Self::Tls),
            _ => None,
        }
    }
}

/// Login for the submission server.
#[derive(Clone)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Submission server settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection security.
    pub security: Security,
    /// Optional login.
    pub credentials: Option<Credentials>,
    /// Name announced in EHLO.
    pub hello_name: String,
    /// Limit on establishing the connection (and TLS handshake).
    pub connect_timeout: Duration,
    /// Limit on the whole exchange after connecting.
    pub session_timeout: Duration,
}

impl SmtpSettings {
    /// Creates settings without credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
            credentials: None,
            hello_name: "localhost".to_string(),
            connect_timeout: Duration::from_secs(10),
            session_timeout: Duration::from_secs(30),
        }
    }

    /// Adds a login.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the EHLO name.
    #[must_use]
    pub fn with_hello_name(mut self, hello_name: impl Into<String>) -> Self {
        self.hello_name = hello_name.into();
        self
    }

    /// Sets the connect and session timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, connect: Duration, session: Duration) -> Self {
        self.connect_timeout = connect;
        self.session_timeout = session;
        self
    }
}

/// Delivers messages through one submission server, one connection per message.
#[derive(Debug, Clone)]
pub struct Transport {
    settings: SmtpSettings,
}

impl Transport {
    /// Creates a transport.
    #[must_use]
    pub const fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Connects, authenticates if configured, sends the message and quits.
    ///
    /// # Errors
    ///
    /// Returns an error if any address is invalid, the connection or TLS
    /// upgrade fails, authentication fails, the server rejects the message,
    /// or the server stops responding ([`Error::Timeout`]).
    pub async fn send(&self, message: &Message) -> Result<()> {
        let (from, recipients) = message.envelope()?;
        let content = message.to_rfc5322();
        let settings = &self.settings;

        let connecting = async {
            match settings.security {
                Security::Tls => connect_tls(&settings.host, settings.port).await,
                Security::StartTls | Security::None => {
                    connect(&settings.host, settings.port).await
                }
            }
        };
        let stream = tokio::time::timeout(settings.connect_timeout, connecting)
            .await
            .map_err(|_| Error::Timeout("connect"))??;

        tokio::time::timeout(
            settings.session_timeout,
            self.deliver(stream, from, recipients, &content),
        )
        .await
        .map_err(|_| Error::Timeout("session"))??;

        info!(
            "Sent \"{}\" to {} recipient(s) via {}",
            message.subject,
            message.to.len(),
            settings.host
        );
        Ok(())
    }

    async fn deliver(
        &self,
        stream: SmtpStream,
        from: Address,
        recipients: Vec<Address>,
        content: &str,
    ) -> Result<()> {
        let settings = &self.settings;

        let client = Client::from_stream(stream)
            .await?
            .ehlo(&settings.hello_name)
            .await?;

        let client = if settings.security == Security::StartTls {
            client.starttls(&settings.host, &settings.hello_name).await?
        } else {
            client
        };

        let client = self.login(client).await?;
        let mut recipients = recipients.into_iter();
        let Some(first) = recipients.next() else {
            return Err(Error::NoRecipients);
        };

        let mut client = client
            .mail_from(from, Some(content.len()))
            .await?
            .rcpt_to(first)
            .await?;
        for recipient in recipients {
            client = client.rcpt_to(recipient).await?;
        }

        let client = client.data().await?.send_message(content.as_bytes()).await?;
        client.quit().await
    }

    async fn login(&self, client: Client<Connected>) -> Result<LoggedIn> {
        match &self.settings.credentials {
            Some(credentials) => Ok(LoggedIn::Authenticated(
                client
                    .authenticate(&credentials.username, &credentials.password)
                    .await?,
            )),
            None => {
                debug!("No SMTP credentials configured; sending unauthenticated");
                Ok(LoggedIn::Anonymous(client))
            }
        }
    }
}

/// Session state after the optional login step.
enum LoggedIn {
    Anonymous(Client<Connected>),
    Authenticated(Client<Authenticated>),
}

impl LoggedIn {
    async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        match self {
            Self::Anonymous(client) => client.mail_from(from, size).await,
            Self::Authenticated(client) => client.mail_from(from, size).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_parse() {
        assert_eq!(Security::parse("STARTTLS"), Some(Security::StartTls));
        assert_eq!(Security::parse("ssl"), Some(Security::Tls));
        assert_eq!(Security::parse("none"), Some(Security::None));
        assert_eq!(Security::parse("smoke"), None);
        assert_eq!(Security::default(), Security::StartTls);
    }

    #[test]
    fn test_credentials_are_redacted() {
        let settings = SmtpSettings::new("smtp.example.com", 587, Security::StartTls)
            .with_credentials("user", "hunter2");
        let debug = format!("{settings:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }
}
