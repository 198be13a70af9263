//! Mail model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::AddressId;
use crate::user::UserId;

/// Unique identifier for a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailId(pub Uuid);

impl MailId {
    /// Generate a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing outcome of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MailStatus {
    /// Processed successfully.
    #[default]
    Ok,
    /// Processing failed; see the error message.
    Error,
}

impl MailStatus {
    /// Convert from the stored flag (true = ok).
    #[must_use]
    pub const fn from_flag(ok: bool) -> Self {
        if ok { Self::Ok } else { Self::Error }
    }

    /// Convert to the stored flag (true = ok).
    #[must_use]
    pub const fn as_flag(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Record of one received message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mail {
    /// Unique identifier.
    pub id: MailId,
    /// Owner of the receiving address.
    pub user_id: UserId,
    /// Receiving address.
    pub address_id: AddressId,
    /// Standard MIME Message-ID, if present.
    pub message_id: Option<String>,
    /// Number of attachments.
    pub num_attachments: i64,
    /// Total message size in bytes.
    pub total_size: i64,
    /// Processing outcome.
    pub status: MailStatus,
    /// Error detail when processing failed.
    pub error_msg: Option<String>,
    /// Last time the row was written.
    pub last_update_time: DateTime<Utc>,
    /// When the message was received.
    pub creation_time: DateTime<Utc>,
}

impl Mail {
    /// Create a new record with a fresh ID. Messages are ok until marked otherwise.
    #[must_use]
    pub fn new(
        user_id: UserId,
        address_id: AddressId,
        message_id: Option<String>,
        num_attachments: i64,
        total_size: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MailId::generate(),
            user_id,
            address_id,
            message_id,
            num_attachments,
            total_size,
            status: MailStatus::Ok,
            error_msg: None,
            last_update_time: now,
            creation_time: now,
        }
    }
}

/// Filter for listing mail records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailFilter {
    /// Only records with this status.
    pub status: Option<MailStatus>,
    /// Only records received by this address.
    pub address_id: Option<AddressId>,
    /// Only records owned by this user.
    pub user_id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_flag() {
        assert!(MailStatus::Ok.as_flag());
        assert_eq!(MailStatus::from_flag(false), MailStatus::Error);
    }

    #[test]
    fn test_new_mail_defaults_to_ok() {
        let mail = Mail::new(UserId::new(1), AddressId::new(2), None, 0, 10);
        assert_eq!(mail.status, MailStatus::Ok);
        assert!(mail.error_msg.is_none());
        assert_ne!(mail.id, MailId::generate());
    }
}
