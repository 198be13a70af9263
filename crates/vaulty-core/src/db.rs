//! Connection pool and schema for the Vaulty database.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::Result;
use crate::address::AddressRepository;
use crate::alias::AliasRepository;
use crate::mail::{LogRepository, MailRepository};
use crate::mailing_list::MailingListRepository;
use crate::social::SocialAuthRepository;
use crate::user::UserRepository;

/// Schema statements, applied in order on every open.
///
/// Table names are shared with the mail processing service and must not change.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS vaulty_users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email_address TEXT NOT NULL,
        password TEXT,
        is_staff INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        is_subscribed INTEGER NOT NULL DEFAULT 0,
        payment_token TEXT,
        date_joined TEXT NOT NULL,
        last_update_time TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER REFERENCES vaulty_users(id) ON DELETE SET NULL,
        address TEXT NOT NULL CHECK (length(address) <= 255),
        is_active INTEGER NOT NULL,
        email_quota INTEGER NOT NULL,
        num_received INTEGER NOT NULL DEFAULT 0,
        max_email_size INTEGER NOT NULL,
        storage_quota INTEGER NOT NULL,
        storage_used INTEGER NOT NULL DEFAULT 0,
        last_renewal_time TEXT NOT NULL,
        storage_backend TEXT NOT NULL CHECK (storage_backend IN ('dropbox', 'gdrive', 's3')),
        storage_token TEXT NOT NULL,
        storage_path TEXT NOT NULL,
        is_whitelist_enabled INTEGER NOT NULL,
        whitelist TEXT NOT NULL DEFAULT '[]',
        last_update_time TEXT NOT NULL,
        creation_time TEXT NOT NULL
    )
    ",
    // At most one active row per address, compared case-insensitively.
    // Replaces the earlier index on the raw column.
    "DROP INDEX IF EXISTS idx_vaulty_addresses_active",
    r"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_vaulty_addresses_active_lower
    ON vaulty_addresses(lower(address)) WHERE is_active = 1
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_mail (
        id TEXT PRIMARY KEY NOT NULL,
        user_id INTEGER NOT NULL REFERENCES vaulty_users(id) ON DELETE CASCADE,
        address_id INTEGER NOT NULL REFERENCES vaulty_addresses(id) ON DELETE CASCADE,
        message_id TEXT,
        num_attachments INTEGER NOT NULL,
        total_size INTEGER NOT NULL,
        status INTEGER NOT NULL DEFAULT 1,
        error_msg TEXT,
        last_update_time TEXT NOT NULL,
        creation_time TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mail_id TEXT REFERENCES vaulty_mail(id) ON DELETE CASCADE,
        msg TEXT NOT NULL,
        log_level INTEGER NOT NULL,
        creation_time TEXT NOT NULL
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_vaulty_logs_mail ON vaulty_logs(mail_id)
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_aliases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        is_active INTEGER NOT NULL,
        alias TEXT NOT NULL,
        dest TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_launch_mailing_list (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email_address TEXT NOT NULL CHECK (length(email_address) <= 255),
        creation_time TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS vaulty_social_auth (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES vaulty_users(id) ON DELETE CASCADE,
        provider TEXT NOT NULL,
        uid TEXT NOT NULL,
        access_token TEXT NOT NULL,
        refresh_token TEXT,
        creation_time TEXT NOT NULL,
        UNIQUE(provider, uid)
    )
    ",
];

/// Shared handle to the Vaulty database.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at the given path.
    ///
    /// Creates the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn open(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        debug!("Opened database at {database_path}");
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository for `vaulty_users`.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Repository for `vaulty_addresses`.
    #[must_use]
    pub fn addresses(&self) -> AddressRepository {
        AddressRepository::new(self.pool.clone())
    }

    /// Repository for `vaulty_mail`.
    #[must_use]
    pub fn mail(&self) -> MailRepository {
        MailRepository::new(self.pool.clone())
    }

    /// Repository for `vaulty_logs`.
    #[must_use]
    pub fn logs(&self) -> LogRepository {
        LogRepository::new(self.pool.clone())
    }

    /// Repository for `vaulty_aliases`.
    #[must_use]
    pub fn aliases(&self) -> AliasRepository {
        AliasRepository::new(self.pool.clone())
    }

    /// Repository for the launch mailing list.
    #[must_use]
    pub fn mailing_list(&self) -> MailingListRepository {
        MailingListRepository::new(self.pool.clone())
    }

    /// Repository for linked third-party logins.
    #[must_use]
    pub fn social_auth(&self) -> SocialAuthRepository {
        SocialAuthRepository::new(self.pool.clone())
    }
}
