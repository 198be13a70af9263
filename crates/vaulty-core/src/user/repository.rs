//! User storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use super::model::{User, UserFilter, UserId};
use crate::{Error, Result};

const SELECT_USER: &str = r"
    SELECT id, username, email_address, password, is_staff, is_active,
           is_subscribed, payment_token, date_joined, last_update_time
    FROM vaulty_users
";

/// Repository for user storage and retrieval.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save a user (insert or update).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the username is taken, or an error if the
    /// database query fails.
    pub async fn save(&self, user: &mut User) -> Result<()> {
        user.last_update_time = Utc::now();

        if let Some(id) = user.id {
            sqlx::query(
                r"
                UPDATE vaulty_users SET
                    username = ?, email_address = ?, password = ?,
                    is_staff = ?, is_active = ?, is_subscribed = ?,
                    payment_token = ?, last_update_time = ?
                WHERE id = ?
                ",
            )
            .bind(&user.username)
            .bind(&user.email_address)
            .bind(&user.password)
            .bind(user.is_staff)
            .bind(user.is_active)
            .bind(user.is_subscribed)
            .bind(&user.payment_token)
            .bind(user.last_update_time)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        } else {
            let result = sqlx::query(
                r"
                INSERT INTO vaulty_users (
                    username, email_address, password, is_staff, is_active,
                    is_subscribed, payment_token, date_joined, last_update_time
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&user.username)
            .bind(&user.email_address)
            .bind(&user.password)
            .bind(user.is_staff)
            .bind(user.is_active)
            .bind(user.is_subscribed)
            .bind(&user.payment_token)
            .bind(user.date_joined)
            .bind(user.last_update_time)
            .execute(&self.pool)
            .await?;

            let id = UserId::new(result.last_insert_rowid());
            user.id = Some(id);
            debug!("Created user {id} ({})", user.username);
        }

        Ok(())
    }

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Find the first user registered with an email address (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "{SELECT_USER} WHERE LOWER(email_address) = ? ORDER BY id LIMIT 1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// List users matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r"{SELECT_USER}
            WHERE (?1 IS NULL OR is_staff = ?1)
              AND (?2 IS NULL OR is_subscribed = ?2)
            ORDER BY date_joined DESC, id DESC"
        ))
        .bind(filter.is_staff)
        .bind(filter.is_subscribed)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    /// Update subscription state and payment token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub async fn set_subscription(
        &self,
        id: UserId,
        is_subscribed: bool,
        payment_token: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE vaulty_users
            SET is_subscribed = ?, payment_token = ?, last_update_time = ?
            WHERE id = ?
            ",
        )
        .bind(is_subscribed)
        .bind(payment_token)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("user", id));
        }
        Ok(())
    }

    /// Delete a user.
    ///
    /// Addresses keep their rows with the owner cleared; mail records cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM vaulty_users WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: Some(UserId::new(row.get("id"))),
        username: row.get("username"),
        email_address: row.get("email_address"),
        password: row.get("password"),
        is_staff: row.get("is_staff"),
        is_active: row.get("is_active"),
        is_subscribed: row.get("is_subscribed"),
        payment_token: row.get("payment_token"),
        date_joined: row.get("date_joined"),
        last_update_time: row.get("last_update_time"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::Database;
    use crate::user::{User, UserFilter};

    #[tokio::test]
    async fn test_save_and_get() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.users();

        let mut user = User::with_email("alice@example.com");
        repo.save(&mut user).await.unwrap();
        let id = user.id.unwrap();

        let loaded = repo.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "alice@example.com");
        assert!(loaded.is_active);
        assert!(!loaded.is_staff);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.users();

        repo.save(&mut User::with_email("bob@example.com"))
            .await
            .unwrap();
        let err = repo
            .save(&mut User::with_email("bob@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_find_by_email_case_insensitive() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.users();

        repo.save(&mut User::with_email("carol@example.com"))
            .await
            .unwrap();

        let found = repo.find_by_email("Carol@Example.com").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_by_email("dave@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subscription_and_filter() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.users();

        let mut paid = User::with_email("paid@example.com");
        repo.save(&mut paid).await.unwrap();
        repo.save(&mut User::with_email("free@example.com"))
            .await
            .unwrap();

        repo.set_subscription(paid.id.unwrap(), true, Some("tok_123"))
            .await
            .unwrap();

        let subscribed = repo
            .list(UserFilter {
                is_subscribed: Some(true),
                ..UserFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(subscribed.len(), 1);
        assert_eq!(subscribed[0].payment_token.as_deref(), Some("tok_123"));

        let all = repo.list(UserFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_set_subscription_missing_user() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .users()
            .set_subscription(crate::UserId::new(42), true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::NotFound { .. }));
    }
}
