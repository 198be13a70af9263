//! Third-party logins linked to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use crate::Result;
use crate::user::UserId;

/// A provider account linked to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAuth {
    /// Row ID (None before the first save).
    pub id: Option<i64>,
    /// Linked user.
    pub user_id: UserId,
    /// Provider name, e.g. `dropbox`.
    pub provider: String,
    /// Account identifier at the provider.
    pub uid: String,
    /// Current access token.
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Refresh token, if the provider issued one.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// When the link was first created.
    pub creation_time: DateTime<Utc>,
}

impl SocialAuth {
    /// Create an unsaved link.
    #[must_use]
    pub fn new(user_id: UserId, provider: &str, uid: &str, access_token: &str) -> Self {
        Self {
            id: None,
            user_id,
            provider: provider.to_string(),
            uid: uid.to_string(),
            access_token: access_token.to_string(),
            refresh_token: None,
            creation_time: Utc::now(),
        }
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }
}

/// Repository for `vaulty_social_auth`.
#[derive(Debug, Clone)]
pub struct SocialAuthRepository {
    pool: SqlitePool,
}

impl SocialAuthRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a link, or refresh the tokens of the existing link for the same
    /// provider account.
    ///
    /// The user of an existing link is never reassigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the query fails.
    pub async fn upsert(&self, auth: &mut SocialAuth) -> Result<()> {
        let row = sqlx::query(
            r"
            INSERT INTO vaulty_social_auth (
                user_id, provider, uid, access_token, refresh_token, creation_time
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(provider, uid) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, vaulty_social_auth.refresh_token)
            RETURNING id, user_id, creation_time
            ",
        )
        .bind(auth.user_id.0)
        .bind(&auth.provider)
        .bind(&auth.uid)
        .bind(&auth.access_token)
        .bind(&auth.refresh_token)
        .bind(auth.creation_time)
        .fetch_one(&self.pool)
        .await?;

        auth.id = Some(row.get("id"));
        auth.user_id = UserId::new(row.get("user_id"));
        auth.creation_time = row.get("creation_time");
        debug!("Linked {} account {} to user {}", auth.provider, auth.uid, auth.user_id);
        Ok(())
    }

    /// Find the link for a provider account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, provider: &str, uid: &str) -> Result<Option<SocialAuth>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, provider, uid, access_token, refresh_token, creation_time
            FROM vaulty_social_auth
            WHERE provider = ? AND uid = ?
            ",
        )
        .bind(provider)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_social_auth))
    }
}

fn row_to_social_auth(row: &SqliteRow) -> SocialAuth {
    SocialAuth {
        id: Some(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        provider: row.get("provider"),
        uid: row.get("uid"),
        access_token: row.get("access_token"),
        refresh_token: row.get("refresh_token"),
        creation_time: row.get("creation_time"),
    }
}
