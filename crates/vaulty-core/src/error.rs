//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (e.g. "address").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A stored value could not be decoded into its domain type.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Creates a not-found error for the given entity kind.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if this error is a uniqueness conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
