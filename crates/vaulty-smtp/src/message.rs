//! Envelope addresses and plain-text messages.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Envelope email address (the part inside `<...>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is not `local@domain`
    /// or contains characters that would break the command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr}: missing @")));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "{addr}: expected exactly one @ between non-empty parts"
            )));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{addr}: contains forbidden characters"
            )));
        }

        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A plain-text message to send.
#[derive(Debug, Clone)]
pub struct Message {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Date header value.
    pub date: DateTime<Utc>,
}

impl Message {
    /// Creates a new message dated now.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            date: Utc::now(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Validated sender and recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if any address is invalid or there are no recipients.
    pub fn envelope(&self) -> Result<(Address, Vec<Address>)> {
        if self.to.is_empty() {
            return Err(Error::NoRecipients);
        }
        let from = Address::new(self.from.as_str())?;
        let to = self
            .to
            .iter()
            .map(|r| Address::new(r.as_str()))
            .collect::<Result<Vec<_>>>()?;
        Ok((from, to))
    }

    /// Builds the RFC 5322 formatted message with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let domain = self.from.rsplit_once('@').map_or("localhost", |(_, d)| d);
        let mut message = String::new();

        let _ = write!(message, "From: {}\r\n", self.from);
        let _ = write!(message, "To: {}\r\n", self.to.join(", "));
        let _ = write!(message, "Subject: {}\r\n", strip_line_breaks(&self.subject));
        let _ = write!(message, "Date: {}\r\n", self.date.to_rfc2822());
        let _ = write!(message, "Message-ID: <{}@{domain}>\r\n", Uuid::new_v4());
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");

        for line in self.body.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }

        message
    }
}

fn strip_line_breaks(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Encodes message content for the DATA phase.
///
/// Normalizes line endings to CRLF, dot-stuffs lines starting with `.`, and
/// appends the terminating `.` line.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let mut out = Vec::with_capacity(body.len() + 16);

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
