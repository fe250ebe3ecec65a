//! Catalog schema - the versioned entity set
//!
//! Data the migration engine versions, not logic: entity structs, the
//! closed enum types stored in text columns, and the ordered registry of
//! catalog migrations.

pub mod models;
pub mod schema;
pub mod types;

pub use models::*;
pub use schema::migrations;
pub use types::{HoldingCommentType, TrackFccStatus};
