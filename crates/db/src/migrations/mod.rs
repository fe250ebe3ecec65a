//! Migration version-control engine
//!
//! Tracks which schema-change units have been applied, enforces mutual
//! exclusion between concurrent invokers, and supports forward/backward
//! movement plus mark-only bookkeeping.

pub mod lock;
pub mod migrator;
pub mod registry;
pub mod status;

pub use lock::MigrationLock;
pub use migrator::{MigrationGroup, MigrationRecord, Migrator};
pub use registry::{Migration, MigrationRegistry};
pub use status::{MigrationState, MigrationStatus, StatusReport};
