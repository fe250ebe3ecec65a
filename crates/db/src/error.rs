//! Error types for the shellac database layer
//!
//! One taxonomy for migration control flow, locking, and catalog row
//! decoding. Errors are returned to the caller unmodified; user-facing
//! formatting and exit codes live in the CLI.

use thiserror::Error;

/// Result type alias for database-layer operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for migration and catalog operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Another process currently holds the migration lock
    #[error("migration lock is already held by another process")]
    LockHeld,

    /// The lock row belongs to a different holder
    #[error("migration lock is not held by this process")]
    LockNotHeld,

    /// Backend fault while acquiring or releasing the lock
    #[error("migration lock backend error: {0}")]
    LockBackend(#[source] sqlx::Error),

    /// Migration table creation conflicts with an existing layout
    #[error("schema error: {0}")]
    Schema(String),

    /// A forward action failed; earlier units of the group stay applied
    #[error("migration {id} failed: {cause}")]
    MigrationFailed { id: String, cause: String },

    /// A reverse action failed; later units of the group stay reversed
    #[error("rollback of migration {id} failed: {cause}")]
    RollbackFailed { id: String, cause: String },

    /// A stored enumerated column holds a value outside its allowed set
    #[error("invalid value {value:?} for {column}")]
    InvalidEnumValue {
        column: &'static str,
        value: String,
    },

    /// Registry construction error (duplicate or malformed unit)
    #[error("migration registry error: {0}")]
    Registry(String),

    /// Connection pool construction failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Any other database fault
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
