//! Migration Registry - the ordered set of schema-change units
//!
//! The registry is supplied by the invoking process at startup and is
//! read-only to the engine. Units are totally ordered by identifier and
//! identifiers must be unique.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};

/// One forward/reverse schema-change unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Unique, sortable identifier (`YYYYMMDD_HHMMSS_name`)
    pub id: String,
    /// SQL applied when migrating forward
    pub up_sql: String,
    /// SQL applied when rolling back; empty means the reverse is a no-op
    pub down_sql: String,
}

impl Migration {
    pub fn new(
        id: impl Into<String>,
        up_sql: impl Into<String>,
        down_sql: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            up_sql: up_sql.into(),
            down_sql: down_sql.into(),
        }
    }

    /// A pure bookkeeping unit with no schema actions.
    pub fn noop(id: impl Into<String>) -> Self {
        Self::new(id, "", "")
    }

    /// True when both actions are empty.
    pub fn is_noop(&self) -> bool {
        self.up_sql.trim().is_empty() && self.down_sql.trim().is_empty()
    }
}

/// Immutable, ordered collection of migration units
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationRegistry {
    migrations: Vec<Migration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a unit list, sorting by identifier.
    pub fn from_units(units: Vec<Migration>) -> DbResult<Self> {
        let mut registry = Self::new();
        for unit in units {
            registry.register(unit)?;
        }
        Ok(registry)
    }

    /// Add a unit, keeping the collection sorted by identifier.
    pub fn register(&mut self, migration: Migration) -> DbResult<()> {
        if migration.id.trim().is_empty() {
            return Err(DbError::Registry(
                "migration identifier must not be empty".to_string(),
            ));
        }
        match self
            .migrations
            .binary_search_by(|m| m.id.cmp(&migration.id))
        {
            Ok(_) => Err(DbError::Registry(format!(
                "duplicate migration identifier: {}",
                migration.id
            ))),
            Err(pos) => {
                self.migrations.insert(pos, migration);
                Ok(())
            }
        }
    }

    /// Units in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Migration> {
        self.migrations
            .binary_search_by(|m| m.id.as_str().cmp(id))
            .ok()
            .map(|pos| &self.migrations[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
