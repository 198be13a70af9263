//! SMTP command serialization.

use crate::extension::AuthMechanism;
use crate::message::Address;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response (SASL-IR)
        initial_response: Option<String>,
    },
    /// Base64 line answering a 334 challenge
    AuthResponse(String),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
        /// SIZE parameter
        size: Option<usize>,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// RSET - Reset transaction
    Rset,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to a CRLF-terminated line.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(response),
            } => format!("AUTH {} {response}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::AuthResponse(response) => response.clone(),
            Self::MailFrom { from, size: None } => format!("MAIL FROM:<{from}>"),
            Self::MailFrom {
                from,
                size: Some(size),
            } => format!("MAIL FROM:<{from}> SIZE={size}"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Whether the serialized line carries credentials and must not be logged.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::AuthResponse(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            hostname: "web.vaulty.net".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO web.vaulty.net\r\n");
    }

    #[test]
    fn test_auth_plain_with_initial_response() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert!(cmd.is_sensitive());
    }

    #[test]
    fn test_auth_login() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(cmd.serialize(), b"AUTH LOGIN\r\n");
    }

    #[test]
    fn test_mail_from() {
        let from = Address::new("noreply@vaulty.net").unwrap();
        let cmd = Command::MailFrom {
            from: from.clone(),
            size: None,
        };
        assert_eq!(cmd.serialize(), b"MAIL FROM:<noreply@vaulty.net>\r\n");

        let cmd = Command::MailFrom {
            from,
            size: Some(1234),
        };
        assert_eq!(cmd.serialize(), b"MAIL FROM:<noreply@vaulty.net> SIZE=1234\r\n");
        assert!(!cmd.is_sensitive());
    }

    #[test]
    fn test_rcpt_to_and_simple_verbs() {
        let cmd = Command::RcptTo {
            to: Address::new("user@example.com").unwrap(),
        };
        assert_eq!(cmd.serialize(), b"RCPT TO:<user@example.com>\r\n");
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Rset.serialize(), b"RSET\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }
}
