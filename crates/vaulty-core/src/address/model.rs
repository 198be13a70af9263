//! Address model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::whitelist::Whitelist;
use crate::user::UserId;

const BYTES_PER_MB: i64 = 1_000_000;

/// Unique identifier for a provisioned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(pub i64);

impl AddressId {
    /// Create a new address ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cloud storage destination for archived mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Dropbox.
    #[default]
    Dropbox,
    /// Google Drive.
    Gdrive,
    /// Amazon S3.
    S3,
}

impl StorageBackend {
    /// Parse from database string representation.
    ///
    /// Returns `None` for unknown backends.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dropbox" => Some(Self::Dropbox),
            "gdrive" => Some(Self::Gdrive),
            "s3" => Some(Self::S3),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dropbox => "dropbox",
            Self::Gdrive => "gdrive",
            Self::S3 => "s3",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Dropbox => "Dropbox",
            Self::Gdrive => "GDrive",
            Self::S3 => "S3",
        }
    }
}

/// Why an incoming message would exceed an address's limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaViolation {
    /// The message alone is larger than the per-email limit.
    EmailSize {
        /// Per-email limit in bytes.
        max_email_size: i64,
    },
    /// Storing the message would exceed the storage quota for the period.
    Storage {
        /// Storage quota in bytes.
        storage_quota: i64,
    },
    /// The address has received its allowed number of emails for the period.
    EmailCount {
        /// Allowed emails per period.
        email_quota: i64,
    },
}

impl QuotaViolation {
    /// Message explaining the rejection for the given recipient.
    #[must_use]
    pub fn message(&self, recipient: &str) -> String {
        match self {
            Self::EmailSize { max_email_size } => format!(
                "This email is larger than allowed for {recipient}: the maximum email size is {} MB.",
                max_email_size / BYTES_PER_MB
            ),
            Self::Storage { storage_quota } => format!(
                "Address {recipient} has hit its storage quota of {} MB for this period.",
                storage_quota / BYTES_PER_MB
            ),
            Self::EmailCount { email_quota } => format!(
                "Address {recipient} has hit its quota of {email_quota} emails for this period."
            ),
        }
    }
}

/// A provisioned inbound email address tied to a storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Unique identifier (None for unsaved addresses).
    pub id: Option<AddressId>,
    /// Owning user, cleared if the user is deleted.
    pub user_id: Option<UserId>,
    /// The email address string.
    pub address: String,
    /// Whether the address currently accepts mail.
    pub is_active: bool,
    /// Max number of emails this address can receive per period.
    pub email_quota: i64,
    /// Number of emails received in the current period.
    pub num_received: i64,
    /// Max size of a single email, in bytes.
    pub max_email_size: i64,
    /// Max storage per period, in bytes.
    pub storage_quota: i64,
    /// Storage used in the current period, in bytes.
    pub storage_used: i64,
    /// Start of the current period.
    pub last_renewal_time: DateTime<Utc>,
    /// Where attachments are stored.
    pub storage_backend: StorageBackend,
    /// Credential for the storage backend.
    #[serde(skip_serializing)]
    pub storage_token: String,
    /// Destination path, in the backend's format.
    pub storage_path: String,
    /// Whether only whitelisted senders are accepted.
    pub is_whitelist_enabled: bool,
    /// Accepted sender patterns.
    pub whitelist: Whitelist,
    /// Last time the row was written.
    pub last_update_time: DateTime<Utc>,
    /// When the address was provisioned.
    pub creation_time: DateTime<Utc>,
}

impl Address {
    /// Create a new, unsaved, active address with the given limits.
    #[must_use]
    pub fn new(
        address: &str,
        storage_backend: StorageBackend,
        email_quota: i64,
        max_email_size: i64,
        storage_quota: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id: None,
            address: address.trim().to_lowercase(),
            is_active: true,
            email_quota,
            num_received: 0,
            max_email_size,
            storage_quota,
            storage_used: 0,
            last_renewal_time: now,
            storage_backend,
            storage_token: String::new(),
            storage_path: String::new(),
            is_whitelist_enabled: false,
            whitelist: Whitelist::default(),
            last_update_time: now,
            creation_time: now,
        }
    }

    /// Sets the owning user.
    #[must_use]
    pub const fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the storage credential and destination path.
    #[must_use]
    pub fn with_storage(mut self, token: impl Into<String>, path: impl Into<String>) -> Self {
        self.storage_token = token.into();
        self.storage_path = path.into();
        self
    }

    /// Enables whitelisting with the given patterns.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.is_whitelist_enabled = true;
        self.whitelist = whitelist;
        self
    }

    /// Checks whether mail from `sender` is accepted.
    ///
    /// Every sender is accepted when whitelisting is disabled.
    #[must_use]
    pub fn accepts_sender(&self, sender: &str) -> bool {
        !self.is_whitelist_enabled || self.whitelist.matches(sender)
    }

    /// Checks whether a message of `size` bytes fits the remaining quotas.
    ///
    /// Limits are checked in order: per-email size, storage, email count.
    ///
    /// # Errors
    ///
    /// Returns the first violated limit.
    pub const fn check_quota(&self, size: i64) -> Result<(), QuotaViolation> {
        if size > self.max_email_size {
            return Err(QuotaViolation::EmailSize {
                max_email_size: self.max_email_size,
            });
        }
        if self.storage_used.saturating_add(size) > self.storage_quota {
            return Err(QuotaViolation::Storage {
                storage_quota: self.storage_quota,
            });
        }
        if self.num_received.saturating_add(1) > self.email_quota {
            return Err(QuotaViolation::EmailCount {
                email_quota: self.email_quota,
            });
        }
        Ok(())
    }
}

/// Filter for listing addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFilter {
    /// Only active (or only inactive) addresses.
    pub is_active: Option<bool>,
    /// Only addresses with whitelisting enabled (or disabled).
    pub is_whitelist_enabled: Option<bool>,
    /// Only addresses owned by this user.
    pub user_id: Option<UserId>,
}
