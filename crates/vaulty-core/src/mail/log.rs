//! Append-only diagnostic trail for mail processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use uuid::Uuid;

use super::model::MailId;
use crate::{Error, Result};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug detail.
    Debug,
    /// Informational.
    Info,
    /// Something was rejected or degraded.
    Warning,
    /// Processing failed.
    Error,
}

impl LogLevel {
    /// Stored integer value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
        }
    }

    /// Display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Unknown stored values read as [`LogLevel::Info`].
impl From<i64> for LogLevel {
    fn from(level: i64) -> Self {
        match level {
            0 => Self::Debug,
            2 => Self::Warning,
            3 => Self::Error,
            _ => Self::Info,
        }
    }
}

/// One log entry, optionally tied to a mail record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    /// Row ID.
    pub id: i64,
    /// Related message, if any.
    pub mail_id: Option<MailId>,
    /// Log text.
    pub msg: String,
    /// Severity.
    pub log_level: LogLevel,
    /// When the entry was written.
    pub creation_time: DateTime<Utc>,
}

/// Repository for `vaulty_logs`. Entries are never updated or deleted directly.
#[derive(Debug, Clone)]
pub struct LogRepository {
    pool: SqlitePool,
}

impl LogRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the referenced mail does not exist or the query fails.
    pub async fn append(
        &self,
        mail_id: Option<MailId>,
        msg: &str,
        log_level: LogLevel,
    ) -> Result<Log> {
        let creation_time = Utc::now();
        let result = sqlx::query(
            "INSERT INTO vaulty_logs (mail_id, msg, log_level, creation_time) VALUES (?, ?, ?, ?)",
        )
        .bind(mail_id.map(|m| m.0.to_string()))
        .bind(msg)
        .bind(log_level.as_i64())
        .bind(creation_time)
        .execute(&self.pool)
        .await?;

        Ok(Log {
            id: result.last_insert_rowid(),
            mail_id,
            msg: msg.to_string(),
            log_level,
            creation_time,
        })
    }

    /// Entries for one message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row cannot be decoded.
    pub async fn for_mail(&self, mail_id: MailId) -> Result<Vec<Log>> {
        let rows = sqlx::query(
            r"
            SELECT id, mail_id, msg, log_level, creation_time
            FROM vaulty_logs
            WHERE mail_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(mail_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_log).collect()
    }

    /// Most recent entries at or above a level, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row cannot be decoded.
    pub async fn recent(&self, min_level: LogLevel, limit: u32) -> Result<Vec<Log>> {
        let rows = sqlx::query(
            r"
            SELECT id, mail_id, msg, log_level, creation_time
            FROM vaulty_logs
            WHERE log_level >= ?
            ORDER BY id DESC
            LIMIT ?
            ",
        )
        .bind(min_level.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_log).collect()
    }
}

fn row_to_log(row: &SqliteRow) -> Result<Log> {
    let mail_id = row
        .get::<Option<String>, _>("mail_id")
        .map(|id| {
            Uuid::parse_str(&id)
                .map(MailId)
                .map_err(|e| Error::InvalidData(format!("log mail id {id}: {e}")))
        })
        .transpose()?;

    Ok(Log {
        id: row.get("id"),
        mail_id,
        msg: row.get("msg"),
        log_level: LogLevel::from(row.get::<i64, _>("log_level")),
        creation_time: row.get("creation_time"),
    })
}
