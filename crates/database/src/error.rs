//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A schema migration step failed.
    #[error("migration step '{step}' failed: {source}")]
    Migration {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Input rejected before reaching storage.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Coarse classification of a [`DatabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested record does not exist.
    NotFound,
    /// The write collided with an existing record.
    Conflict,
    /// The input was rejected before reaching storage.
    Invalid,
    /// The storage engine itself failed.
    StorageFailure,
}

impl DatabaseError {
    /// Classify this error so callers can tell failure classes apart.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound { .. } => ErrorKind::NotFound,
            DatabaseError::AlreadyExists { .. } => ErrorKind::Conflict,
            DatabaseError::Validation(_) => ErrorKind::Invalid,
            DatabaseError::Sqlx(_) | DatabaseError::Migration { .. } => ErrorKind::StorageFailure,
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
