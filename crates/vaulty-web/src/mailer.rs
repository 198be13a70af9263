//! Outgoing notification mail.

use tracing::{error, info};
use vaulty_smtp::{Message, Transport};

use crate::config::{ConfigError, MailConfig};

/// Subject of the launch list confirmation.
pub const LAUNCH_CONFIRMATION_SUBJECT: &str = "Vaulty: Launch List Confirmation";

/// Body of the launch list confirmation.
pub const LAUNCH_CONFIRMATION_BODY: &str = "Thank you for expressing interest in Vaulty!\n\n\
     We will update you once Vaulty is ready for business :)";

/// How confirmation mail leaves the server.
#[derive(Debug, Clone)]
pub enum Mailer {
    /// Deliver through an SMTP submission server.
    Smtp {
        /// Configured transport.
        transport: Transport,
        /// Sender address.
        from: String,
    },
    /// No server configured: record what would have been sent.
    LogOnly {
        /// Sender address.
        from: String,
    },
}

impl Mailer {
    /// Builds a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the security mode is unknown.
    pub fn from_config(config: &MailConfig) -> Result<Self, ConfigError> {
        let from = config.from.clone();
        Ok(match config.smtp_settings()? {
            Some(settings) => Self::Smtp {
                transport: Transport::new(settings),
                from,
            },
            None => Self::LogOnly { from },
        })
    }

    /// Sender address.
    #[must_use]
    pub fn from_address(&self) -> &str {
        match self {
            Self::Smtp { from, .. } | Self::LogOnly { from } => from,
        }
    }

    /// Builds the launch list confirmation for `recipient`.
    #[must_use]
    pub fn launch_confirmation(&self, recipient: &str) -> Message {
        Message::new(
            self.from_address(),
            LAUNCH_CONFIRMATION_SUBJECT,
            LAUNCH_CONFIRMATION_BODY,
        )
        .to(recipient)
    }

    /// Sends the launch list confirmation.
    ///
    /// Returns whether the message went out. Failures are logged, never
    /// propagated: the signup itself has already been stored.
    pub async fn send_launch_confirmation(&self, recipient: &str) -> bool {
        let message = self.launch_confirmation(recipient);

        match self {
            Self::Smtp { transport, .. } => match transport.send(&message).await {
                Ok(()) => {
                    info!(recipient, "sent launch confirmation");
                    true
                }
                Err(err) => {
                    error!(recipient, error = %err, "failed to send launch confirmation");
                    false
                }
            },
            Self::LogOnly { .. } => {
                info!(
                    recipient,
                    subject = LAUNCH_CONFIRMATION_SUBJECT,
                    "mail not configured; confirmation not sent"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, Instant};

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_confirmation_message() {
        let mailer = Mailer::from_config(&MailConfig::default()).unwrap();
        assert!(matches!(mailer, Mailer::LogOnly { .. }));

        let message = mailer.launch_confirmation("user@example.com");
        assert_eq!(message.from, "noreply@vaulty.net");
        assert_eq!(message.to, vec!["user@example.com".to_string()]);
        assert_eq!(message.subject, "Vaulty: Launch List Confirmation");
        assert!(message.body.starts_with("Thank you for expressing interest in Vaulty!\n\n"));
        assert!(message.body.ends_with("ready for business :)"));
    }

    #[test]
    fn test_smtp_when_host_configured() {
        let config = MailConfig {
            host: Some("smtp.example.com".into()),
            from: "hello@vaulty.net".into(),
            ..MailConfig::default()
        };
        let mailer = Mailer::from_config(&config).unwrap();
        assert!(matches!(mailer, Mailer::Smtp { .. }));
        assert_eq!(mailer.from_address(), "hello@vaulty.net");
    }

    #[tokio::test]
    async fn test_unreachable_server_does_not_fail_signup() {
        let config = MailConfig {
            host: Some("127.0.0.1".into()),
            port: 9,
            security: "none".into(),
            ..MailConfig::default()
        };
        let mailer = Mailer::from_config(&config).unwrap();
        assert!(!mailer.send_launch_confirmation("user@example.com").await);
    }

    #[tokio::test]
    async fn test_silent_server_does_not_hold_signup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            // Accept and never greet.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let config = MailConfig {
            host: Some("127.0.0.1".into()),
            port,
            security: "none".into(),
            timeout_secs: 1,
            ..MailConfig::default()
        };
        let mailer = Mailer::from_config(&config).unwrap();

        let started = Instant::now();
        assert!(!mailer.send_launch_confirmation("user@example.com").await);
        assert!(started.elapsed() < Duration::from_secs(3));

        server.abort();
    }

    #[test]
    fn test_unknown_security_is_a_config_error() {
        let config = MailConfig {
            host: Some("smtp.example.com".into()),
            security: "bogus".into(),
            ..MailConfig::default()
        };
        assert!(matches!(
            Mailer::from_config(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
