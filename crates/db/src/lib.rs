//! # shellac-db: Database Layer for shellac
//!
//! The migration version-control engine and catalog schema for the shellac
//! music inventory. Provides the migration registry, the advisory lock,
//! the migrator (apply / rollback / mark / unmark), the read-only status
//! reporter, and the versioned catalog entities.
//!
//! The serving API is a separate, future component; it reads the catalog
//! tables this crate versions but never touches the migration ledger.

pub mod catalog;
pub mod database;
pub mod error;
pub mod migrations;

// Re-export core types
pub use database::{connect, DEFAULT_DATABASE_URL};
pub use error::{DbError, DbResult};
pub use migrations::*;
