//! Forwarding aliases.
//!
//! An alias maps one inbound address string to a destination. Resolution only
//! considers active aliases.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use crate::{Error, Result};

/// Unique identifier for an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasId(pub i64);

impl AliasId {
    /// Create a new alias ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AliasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A forwarding alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Unique identifier (None for unsaved aliases).
    pub id: Option<AliasId>,
    /// Inbound address string.
    pub alias: String,
    /// Destination address.
    pub dest: String,
    /// Whether the alias is used for resolution.
    pub is_active: bool,
}

impl Alias {
    /// Create a new, active, unsaved alias.
    #[must_use]
    pub fn new(alias: &str, dest: &str) -> Self {
        Self {
            id: None,
            alias: alias.trim().to_lowercase(),
            dest: dest.trim().to_string(),
            is_active: true,
        }
    }
}

/// Repository for `vaulty_aliases`.
#[derive(Debug, Clone)]
pub struct AliasRepository {
    pool: SqlitePool,
}

impl AliasRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save an alias (insert or update).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when updating an unknown ID, or an error if
    /// the database query fails.
    pub async fn save(&self, alias: &mut Alias) -> Result<()> {
        if let Some(id) = alias.id {
            let result = sqlx::query(
                "UPDATE vaulty_aliases SET alias = ?, dest = ?, is_active = ? WHERE id = ?",
            )
            .bind(&alias.alias)
            .bind(&alias.dest)
            .bind(alias.is_active)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(Error::not_found("alias", id));
            }
        } else {
            let result = sqlx::query(
                "INSERT INTO vaulty_aliases (alias, dest, is_active) VALUES (?, ?, ?)",
            )
            .bind(&alias.alias)
            .bind(&alias.dest)
            .bind(alias.is_active)
            .execute(&self.pool)
            .await?;

            let id = AliasId::new(result.last_insert_rowid());
            alias.id = Some(id);
            debug!("Created alias {id}: {} -> {}", alias.alias, alias.dest);
        }
        Ok(())
    }

    /// List aliases, optionally only active or inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, is_active: Option<bool>) -> Result<Vec<Alias>> {
        let rows = sqlx::query(
            r"
            SELECT id, alias, dest, is_active FROM vaulty_aliases
            WHERE (?1 IS NULL OR is_active = ?1)
            ORDER BY alias ASC, id ASC
            ",
        )
        .bind(is_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_alias).collect())
    }

    /// Destination of the first active alias matching an address string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn resolve(&self, alias: &str) -> Result<Option<String>> {
        let dest = sqlx::query_scalar(
            r"
            SELECT dest FROM vaulty_aliases
            WHERE alias = ? AND is_active = 1
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(alias.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(dest)
    }

    /// Enable or disable an alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the alias does not exist.
    pub async fn set_active(&self, id: AliasId, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE vaulty_aliases SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("alias", id));
        }
        Ok(())
    }
}

fn row_to_alias(row: &SqliteRow) -> Alias {
    Alias {
        id: Some(AliasId::new(row.get("id"))),
        alias: row.get("alias"),
        dest: row.get("dest"),
        is_active: row.get("is_active"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_resolve_ignores_inactive() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.aliases();

        let mut support = Alias::new("Support@vaulty.net", "team@example.com");
        repo.save(&mut support).await.unwrap();

        assert_eq!(
            repo.resolve("support@vaulty.net").await.unwrap().as_deref(),
            Some("team@example.com")
        );

        repo.set_active(support.id.unwrap(), false).await.unwrap();
        assert!(repo.resolve("support@vaulty.net").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_active() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.aliases();

        let mut old = Alias::new("old@vaulty.net", "a@example.com");
        old.is_active = false;
        repo.save(&mut old).await.unwrap();
        repo.save(&mut Alias::new("new@vaulty.net", "b@example.com"))
            .await
            .unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let inactive = repo.list(Some(false)).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].alias, "old@vaulty.net");
    }

    #[tokio::test]
    async fn test_update_existing_alias() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.aliases();

        let mut alias = Alias::new("info@vaulty.net", "a@example.com");
        repo.save(&mut alias).await.unwrap();
        alias.dest = "b@example.com".to_string();
        repo.save(&mut alias).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].dest, "b@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_alias() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.aliases();

        let mut alias = Alias::new("lost@vaulty.net", "a@example.com");
        alias.id = Some(AliasId::new(9));
        let err = repo.save(&mut alias).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "alias", .. }));
        assert!(repo.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_active_missing_alias() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .aliases()
            .set_active(AliasId::new(7), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
