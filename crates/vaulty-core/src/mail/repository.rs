//! Mail record storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, warn};
use uuid::Uuid;

use super::model::{Mail, MailFilter, MailId, MailStatus};
use crate::address::AddressId;
use crate::user::UserId;
use crate::{Error, Result};

const SELECT_MAIL: &str = r"
    SELECT id, user_id, address_id, message_id, num_attachments, total_size,
           status, error_msg, last_update_time, creation_time
    FROM vaulty_mail
";

/// Repository for received mail records.
#[derive(Debug, Clone)]
pub struct MailRepository {
    pool: SqlitePool,
}

impl MailRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new mail record.
    ///
    /// # Errors
    ///
    /// Returns an error if the user or address does not exist or the query fails.
    pub async fn insert(&self, mail: &Mail) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO vaulty_mail (
                id, user_id, address_id, message_id, num_attachments, total_size,
                status, error_msg, last_update_time, creation_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(mail.id.0.to_string())
        .bind(mail.user_id.0)
        .bind(mail.address_id.0)
        .bind(&mail.message_id)
        .bind(mail.num_attachments)
        .bind(mail.total_size)
        .bind(mail.status.as_flag())
        .bind(&mail.error_msg)
        .bind(mail.last_update_time)
        .bind(mail.creation_time)
        .execute(&self.pool)
        .await?;

        debug!("Recorded mail {} for address {}", mail.id, mail.address_id);
        Ok(())
    }

    /// Get a mail record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row cannot be decoded.
    pub async fn get(&self, id: MailId) -> Result<Option<Mail>> {
        let row = sqlx::query(&format!("{SELECT_MAIL} WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_mail).transpose()
    }

    /// List mail records matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row cannot be decoded.
    pub async fn list(&self, filter: MailFilter) -> Result<Vec<Mail>> {
        let rows = sqlx::query(&format!(
            r"{SELECT_MAIL}
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR address_id = ?2)
              AND (?3 IS NULL OR user_id = ?3)
            ORDER BY creation_time DESC"
        ))
        .bind(filter.status.map(MailStatus::as_flag))
        .bind(filter.address_id.map(|a| a.0))
        .bind(filter.user_id.map(|u| u.0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_mail).collect()
    }

    /// Update the processing outcome of a message.
    ///
    /// Status and error message are the only fields that change after insert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown ID.
    pub async fn set_status(
        &self,
        id: MailId,
        status: MailStatus,
        error_msg: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE vaulty_mail
            SET status = ?, error_msg = ?, last_update_time = ?
            WHERE id = ?
            ",
        )
        .bind(status.as_flag())
        .bind(error_msg)
        .bind(Utc::now())
        .bind(id.0.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("mail", id));
        }
        if status == MailStatus::Error {
            warn!("Mail {id} failed: {}", error_msg.unwrap_or("unknown error"));
        }
        Ok(())
    }
}

fn row_to_mail(row: &SqliteRow) -> Result<Mail> {
    let id: String = row.get("id");
    let uuid = Uuid::parse_str(&id)
        .map_err(|e| Error::InvalidData(format!("mail id {id}: {e}")))?;

    Ok(Mail {
        id: MailId(uuid),
        user_id: UserId::new(row.get("user_id")),
        address_id: AddressId::new(row.get("address_id")),
        message_id: row.get("message_id"),
        num_attachments: row.get("num_attachments"),
        total_size: row.get("total_size"),
        status: MailStatus::from_flag(row.get("status")),
        error_msg: row.get("error_msg"),
        last_update_time: row.get("last_update_time"),
        creation_time: row.get("creation_time"),
    })
}
