//! Address storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::{debug, info};

use super::model::{Address, AddressFilter, AddressId, StorageBackend};
use super::whitelist::Whitelist;
use crate::user::UserId;
use crate::{Error, Result};

const SELECT_ADDRESS: &str = r"
    SELECT id, user_id, address, is_active, email_quota, num_received,
           max_email_size, storage_quota, storage_used, last_renewal_time,
           storage_backend, storage_token, storage_path, is_whitelist_enabled,
           whitelist, last_update_time, creation_time
    FROM vaulty_addresses
";

/// Repository for provisioned addresses.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    pub(crate) const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save an address (insert or update).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if another active row already uses the same
    /// address string, [`Error::NotFound`] when updating an unknown ID, or an
    /// error if the database query fails.
    pub async fn save(&self, address: &mut Address) -> Result<()> {
        address.address = address.address.trim().to_lowercase();
        address.last_update_time = Utc::now();
        let whitelist = serde_json::to_string(&address.whitelist)?;

        if let Some(id) = address.id {
            let result = sqlx::query(
                r"
                UPDATE vaulty_addresses SET
                    user_id = ?, address = ?, is_active = ?,
                    email_quota = ?, num_received = ?, max_email_size = ?,
                    storage_quota = ?, storage_used = ?, last_renewal_time = ?,
                    storage_backend = ?, storage_token = ?, storage_path = ?,
                    is_whitelist_enabled = ?, whitelist = ?, last_update_time = ?
                WHERE id = ?
                ",
            )
            .bind(address.user_id.map(|u| u.0))
            .bind(&address.address)
            .bind(address.is_active)
            .bind(address.email_quota)
            .bind(address.num_received)
            .bind(address.max_email_size)
            .bind(address.storage_quota)
            .bind(address.storage_used)
            .bind(address.last_renewal_time)
            .bind(address.storage_backend.as_str())
            .bind(&address.storage_token)
            .bind(&address.storage_path)
            .bind(address.is_whitelist_enabled)
            .bind(&whitelist)
            .bind(address.last_update_time)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(Error::not_found("address", id));
            }
        } else {
            let result = sqlx::query(
                r"
                INSERT INTO vaulty_addresses (
                    user_id, address, is_active, email_quota, num_received,
                    max_email_size, storage_quota, storage_used, last_renewal_time,
                    storage_backend, storage_token, storage_path,
                    is_whitelist_enabled, whitelist, last_update_time, creation_time
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(address.user_id.map(|u| u.0))
            .bind(&address.address)
            .bind(address.is_active)
            .bind(address.email_quota)
            .bind(address.num_received)
            .bind(address.max_email_size)
            .bind(address.storage_quota)
            .bind(address.storage_used)
            .bind(address.last_renewal_time)
            .bind(address.storage_backend.as_str())
            .bind(&address.storage_token)
            .bind(&address.storage_path)
            .bind(address.is_whitelist_enabled)
            .bind(&whitelist)
            .bind(address.last_update_time)
            .bind(address.creation_time)
            .execute(&self.pool)
            .await?;

            let id = AddressId::new(result.last_insert_rowid());
            address.id = Some(id);
            info!("Provisioned address {} ({id})", address.address);
        }

        Ok(())
    }

    /// Get address by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row cannot be decoded.
    pub async fn get(&self, id: AddressId) -> Result<Option<Address>> {
        let row = sqlx::query(&format!("{SELECT_ADDRESS} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_address).transpose()
    }

    /// Find the active row for an address string (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row cannot be decoded.
    pub async fn find_active(&self, address: &str) -> Result<Option<Address>> {
        let row = sqlx::query(&format!(
            "{SELECT_ADDRESS} WHERE lower(address) = ? AND is_active = 1"
        ))
        .bind(address.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_address).transpose()
    }

    /// List addresses matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row cannot be decoded.
    pub async fn list(&self, filter: AddressFilter) -> Result<Vec<Address>> {
        let rows = sqlx::query(&format!(
            r"{SELECT_ADDRESS}
            WHERE (?1 IS NULL OR is_active = ?1)
              AND (?2 IS NULL OR is_whitelist_enabled = ?2)
              AND (?3 IS NULL OR user_id = ?3)
            ORDER BY creation_time DESC, id DESC"
        ))
        .bind(filter.is_active)
        .bind(filter.is_whitelist_enabled)
        .bind(filter.user_id.map(|u| u.0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_address).collect()
    }

    /// Activate or deactivate an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when activating an address string that is
    /// already active elsewhere, [`Error::NotFound`] for an unknown ID.
    pub async fn set_active(&self, id: AddressId, is_active: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE vaulty_addresses SET is_active = ?, last_update_time = ? WHERE id = ?",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("address", id));
        }
        debug!("Address {id} active = {is_active}");
        Ok(())
    }

    /// Account for one delivered message of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown ID.
    pub async fn record_delivery(&self, id: AddressId, size: i64) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE vaulty_addresses
            SET num_received = num_received + 1,
                storage_used = storage_used + ?,
                last_update_time = ?
            WHERE id = ?
            ",
        )
        .bind(size)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("address", id));
        }
        Ok(())
    }

    /// Start a new quota period: clear counters and stamp the renewal time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown ID.
    pub async fn renew(&self, id: AddressId) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            UPDATE vaulty_addresses
            SET num_received = 0, storage_used = 0,
                last_renewal_time = ?, last_update_time = ?
            WHERE id = ?
            ",
        )
        .bind(now)
        .bind(now)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("address", id));
        }
        info!("Renewed quota period for address {id}");
        Ok(())
    }

    /// Replace the whitelist settings of an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown ID.
    pub async fn update_whitelist(
        &self,
        id: AddressId,
        enabled: bool,
        whitelist: &Whitelist,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE vaulty_addresses
            SET is_whitelist_enabled = ?, whitelist = ?, last_update_time = ?
            WHERE id = ?
            ",
        )
        .bind(enabled)
        .bind(serde_json::to_string(whitelist)?)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("address", id));
        }
        Ok(())
    }
}

fn row_to_address(row: &SqliteRow) -> Result<Address> {
    let backend: String = row.get("storage_backend");
    let storage_backend = StorageBackend::parse(&backend)
        .ok_or_else(|| Error::InvalidData(format!("unknown storage backend: {backend}")))?;
    let whitelist: String = row.get("whitelist");

    Ok(Address {
        id: Some(AddressId::new(row.get("id"))),
        user_id: row.get::<Option<i64>, _>("user_id").map(UserId::new),
        address: row.get("address"),
        is_active: row.get("is_active"),
        email_quota: row.get("email_quota"),
        num_received: row.get("num_received"),
        max_email_size: row.get("max_email_size"),
        storage_quota: row.get("storage_quota"),
        storage_used: row.get("storage_used"),
        last_renewal_time: row.get("last_renewal_time"),
        storage_backend,
        storage_token: row.get("storage_token"),
        storage_path: row.get("storage_path"),
        is_whitelist_enabled: row.get("is_whitelist_enabled"),
        whitelist: serde_json::from_str(&whitelist)?,
        last_update_time: row.get("last_update_time"),
        creation_time: row.get("creation_time"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::address::{Address, AddressFilter, StorageBackend, Whitelist};
    use crate::user::User;
    use crate::{Database, Error};

    fn sample(address: &str) -> Address {
        Address::new(address, StorageBackend::Dropbox, 100, 5_000_000, 50_000_000)
            .with_storage("token", "/vaulty")
    }

    #[tokio::test]
    async fn test_save_and_find_active() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        let mut address = sample("Inbox@Vaulty.net")
            .with_whitelist(Whitelist::new(["@example.com", "boss@corp.example"]));
        repo.save(&mut address).await.unwrap();

        let found = repo.find_active("inbox@vaulty.net").await.unwrap().unwrap();
        assert_eq!(found.id, address.id);
        assert_eq!(found.storage_backend, StorageBackend::Dropbox);
        assert!(found.is_whitelist_enabled);
        assert_eq!(found.whitelist.patterns().len(), 2);
        assert!(found.accepts_sender("someone@example.com"));
    }

    #[tokio::test]
    async fn test_two_active_rows_conflict() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        repo.save(&mut sample("dup@vaulty.net")).await.unwrap();
        let err = repo.save(&mut sample("dup@vaulty.net")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_active_uniqueness_ignores_case() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        repo.save(&mut sample("mixed@vaulty.net")).await.unwrap();

        let mut shouty = sample("mixed@vaulty.net");
        shouty.address = " MIXED@Vaulty.NET".to_string();
        let err = repo.save(&mut shouty).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(shouty.address, "mixed@vaulty.net");
    }

    #[tokio::test]
    async fn test_update_unknown_address() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        let mut ghost = sample("ghost@vaulty.net");
        ghost.id = Some(crate::AddressId::new(42));
        let err = repo.save(&mut ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "address", .. }));
        assert!(repo.list(AddressFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_rows_allow_new_active() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        let mut first = sample("reuse@vaulty.net");
        repo.save(&mut first).await.unwrap();
        repo.set_active(first.id.unwrap(), false).await.unwrap();

        let mut second = sample("reuse@vaulty.net");
        repo.save(&mut second).await.unwrap();

        // The old row cannot come back while the new one is active.
        let err = repo.set_active(first.id.unwrap(), true).await.unwrap_err();
        assert!(err.is_conflict());

        let inactive = repo
            .list(AddressFilter {
                is_active: Some(false),
                ..AddressFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, first.id);
    }

    #[tokio::test]
    async fn test_record_delivery_and_renew() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        let mut address = sample("counted@vaulty.net");
        repo.save(&mut address).await.unwrap();
        let id = address.id.unwrap();

        repo.record_delivery(id, 1_500).await.unwrap();
        repo.record_delivery(id, 500).await.unwrap();

        let loaded = repo.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.num_received, 2);
        assert_eq!(loaded.storage_used, 2_000);

        repo.renew(id).await.unwrap();
        let renewed = repo.get(id).await.unwrap().unwrap();
        assert_eq!(renewed.num_received, 0);
        assert_eq!(renewed.storage_used, 0);
        assert!(renewed.last_renewal_time >= loaded.last_renewal_time);
    }

    #[tokio::test]
    async fn test_update_whitelist() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.addresses();

        let mut address = sample("guarded@vaulty.net");
        repo.save(&mut address).await.unwrap();
        let id = address.id.unwrap();

        repo.update_whitelist(id, true, &Whitelist::new(["friend@example.com"]))
            .await
            .unwrap();

        let loaded = repo.get(id).await.unwrap().unwrap();
        assert!(loaded.accepts_sender("friend@example.com"));
        assert!(!loaded.accepts_sender("foe@example.com"));

        let filtered = repo
            .list(AddressFilter {
                is_whitelist_enabled: Some(true),
                ..AddressFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_user_delete_clears_owner() {
        let db = Database::in_memory().await.unwrap();

        let mut user = User::with_email("owner@example.com");
        db.users().save(&mut user).await.unwrap();
        let user_id = user.id.unwrap();

        let mut address = sample("owned@vaulty.net").with_user(user_id);
        db.addresses().save(&mut address).await.unwrap();

        let owned = db
            .addresses()
            .list(AddressFilter {
                user_id: Some(user_id),
                ..AddressFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(owned.len(), 1);

        db.users().delete(user_id).await.unwrap();
        let loaded = db.addresses().get(address.id.unwrap()).await.unwrap().unwrap();
        assert!(loaded.user_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_address_errors() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .addresses()
            .renew(crate::AddressId::new(7))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
