//! Error types for flashdeck-store

use thiserror::Error;
use uuid::Uuid;

/// Store error type
#[derive(Debug, Error)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error while preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Row missing or owned by another user
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Requested id
        id: Uuid,
    },

    /// Write refused because of the current state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Conditional success insert lost against the quota
    #[error("generation quota exceeded")]
    QuotaExceeded,

    /// Domain rule violated
    #[error(transparent)]
    Domain(#[from] flashdeck_core::Error),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Map a unique-constraint violation to [`Error::Conflict`]
    pub(crate) fn unique_or(err: sqlx::Error, conflict: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(conflict.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("invalid json: {err}"))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
