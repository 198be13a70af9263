//! SMTP replies and their parser.

use crate::error::{Error, Result};

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts the reply into an error carrying its code and text.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::reply(self.code.as_u16(), self.text())
    }

    /// Returns self if the code matches, or the reply as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reply`] if the code differs.
    pub fn expect_code(self, expected: ReplyCode) -> Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Returns self for 2xx replies, or the reply as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reply`] for non-2xx replies.
    pub fn expect_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses an SMTP reply from its response lines (without line terminators).
///
/// - Single: `250 OK`
/// - Multi: `250-First`, `250-Second`, `250 Last`
///
/// # Errors
///
/// Returns an error if the reply is malformed or the lines disagree on the code.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("Empty reply".into()));
    };

    let code_str = first
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {first}")))?;
    let code = code_str
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))?;

    let mut text = Vec::with_capacity(lines.len());
    for line in lines {
        if !line.starts_with(code_str) {
            return Err(Error::Protocol(format!("Mismatched reply line: {line}")));
        }
        match line.len() {
            3 => text.push(String::new()),
            n if n > 3 => text.push(line.get(4..).unwrap_or_default().to_string()),
            _ => return Err(Error::Protocol(format!("Malformed reply line: {line}"))),
        }
    }

    Ok(Reply {
        code: ReplyCode::new(code),
        lines: text,
    })
}

/// Checks if a line ends a reply.
///
/// Continuation lines use `-` after the code; the last line uses a space or
/// nothing at all.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    match line.as_bytes().get(3) {
        Some(b' ') => true,
        Some(_) => false,
        None => line.len() == 3,
    }
}
