//! Service extensions advertised in the EHLO reply.

/// SMTP extension discovered from EHLO.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - Authentication
    Auth(Vec<AuthMechanism>),
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
    /// Anything else, kept verbatim
    Other(String),
}

impl Extension {
    /// Parses one extension line from the EHLO reply.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Other(line.to_string());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(parts.filter_map(AuthMechanism::parse).collect()),
            "SIZE" => Self::Size(parts.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            _ => Self::Other(line.to_string()),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN - single-step plaintext
    Plain,
    /// LOGIN - legacy two-step plaintext
    Login,
}

impl AuthMechanism {
    /// Parses a mechanism name; unsupported mechanisms yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            _ => None,
        }
    }

    /// Returns the mechanism name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_extensions() {
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("SIZE 35882577"), Extension::Size(Some(35_882_577)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
    }

    #[test]
    fn test_parse_auth_skips_unsupported() {
        assert_eq!(
            Extension::parse("AUTH LOGIN CRAM-MD5 PLAIN XOAUTH2"),
            Extension::Auth(vec![AuthMechanism::Login, AuthMechanism::Plain])
        );
    }

    #[test]
    fn test_parse_other() {
        assert_eq!(
            Extension::parse("ENHANCEDSTATUSCODES"),
            Extension::Other("ENHANCEDSTATUSCODES".into())
        );
    }
}
