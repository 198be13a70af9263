//! User model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (None for unsaved users).
    pub id: Option<UserId>,
    /// Login name.
    pub username: String,
    /// Contact email address.
    pub email_address: String,
    /// Opaque password hash. Users created through social login have none.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Whether the user may access the admin console.
    pub is_staff: bool,
    /// Whether the account is enabled.
    pub is_active: bool,
    /// Whether the user has a paid subscription.
    pub is_subscribed: bool,
    /// Payment provider token.
    #[serde(skip_serializing)]
    pub payment_token: Option<String>,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
    /// Last time the row was written.
    pub last_update_time: DateTime<Utc>,
}

impl User {
    /// Create a new, unsaved user whose username is the email address.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let now = Utc::now();
        let email = email.trim().to_lowercase();
        Self {
            id: None,
            username: email.clone(),
            email_address: email,
            password: None,
            is_staff: false,
            is_active: true,
            is_subscribed: false,
            payment_token: None,
            date_joined: now,
            last_update_time: now,
        }
    }
}

/// Filter for listing users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Only staff (or only non-staff) users.
    pub is_staff: Option<bool>,
    /// Only subscribed (or only unsubscribed) users.
    pub is_subscribed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_email_normalizes() {
        let user = User::with_email("  Alice@Example.COM ");
        assert_eq!(user.username, "alice@example.com");
        assert_eq!(user.email_address, "alice@example.com");
        assert!(user.is_active);
        assert!(!user.is_subscribed);
        assert!(user.id.is_none());
    }
}
