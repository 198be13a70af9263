//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server returned an error reply.
    #[error("SMTP error {code}: {message}")]
    Reply {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error text from the server.
        message: String,
    },

    /// Unexpected or malformed server response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server closed the connection mid-exchange.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Invalid envelope address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message has no recipients.
    #[error("No recipients specified")]
    NoRecipients,

    /// Message exceeds the size advertised by the server.
    #[error("Message exceeds size limit: {size} > {limit} bytes")]
    MessageTooLarge {
        /// Message size.
        size: usize,
        /// Advertised limit.
        limit: usize,
    },

    /// The server did not respond in time.
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates an error from a reply code and message.
    #[must_use]
    pub fn reply(code: u16, message: impl Into<String>) -> Self {
        Self::Reply {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Reply { code, .. } if *code >= 400 && *code < 500)
    }
}
