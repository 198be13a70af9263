//! Launch mailing list signups.
//!
//! Rows are created by the public signup form and read by the admin console.
//! The same address may sign up more than once; each submission is a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::info;

use crate::Result;

/// One signup for the launch announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSignup {
    /// Row ID.
    pub id: i64,
    /// Submitted address, as validated by the signup form.
    pub email_address: String,
    /// When the signup was received.
    pub creation_time: DateTime<Utc>,
}

/// Repository for the launch mailing list.
#[derive(Debug, Clone)]
pub struct MailingListRepository {
    pool: SqlitePool,
}

impl MailingListRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a signup.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add(&self, email_address: &str) -> Result<LaunchSignup> {
        let creation_time = Utc::now();
        let result = sqlx::query(
            "INSERT INTO vaulty_launch_mailing_list (email_address, creation_time) VALUES (?, ?)",
        )
        .bind(email_address)
        .bind(creation_time)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Launch list signup #{id}");
        Ok(LaunchSignup {
            id,
            email_address: email_address.to_string(),
            creation_time,
        })
    }

    /// All signups, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<LaunchSignup>> {
        let rows = sqlx::query(
            r"
            SELECT id, email_address, creation_time
            FROM vaulty_launch_mailing_list
            ORDER BY creation_time DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_signup).collect())
    }

    /// Number of signups.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM vaulty_launch_mailing_list")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_signup(row: &SqliteRow) -> LaunchSignup {
    LaunchSignup {
        id: row.get("id"),
        email_address: row.get("email_address"),
        creation_time: row.get("creation_time"),
    }
}
