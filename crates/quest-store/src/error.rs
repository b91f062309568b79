//! Error types for the persistence layer.
//!
//! Infrastructure errors ([`DbError`]) cover pool setup and migrations.
//! Operational errors are mapped straight into
//! [`quest_core::ports::StorageError`] at the port boundary so the core
//! never sees a raw driver error.

use quest_core::ports::StorageError;

/// Errors that can occur while setting up the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Map an operational `sqlx` error into the port-level storage error.
///
/// `RowNotFound` becomes [`StorageError::NotFound`]; everything else is a
/// transient [`StorageError::Unavailable`].
pub(crate) fn to_storage(error: sqlx::Error) -> StorageError {
    match error {
        sqlx::Error::RowNotFound => StorageError::NotFound("row not found".to_owned()),
        other => StorageError::Unavailable(other.to_string()),
    }
}
