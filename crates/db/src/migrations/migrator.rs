//! Migrator - applies, reverses, and marks migration units
//!
//! Orchestrates the registry against the ledger. Every mutating operation
//! takes the advisory lock, runs one transaction per unit (the ledger
//! write rides in the same transaction as the unit's schema change), and
//! releases the lock on all exit paths. Failure stops the invocation at
//! the failing unit; earlier units of the group stay committed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, PgPool, Row};
use tracing::{debug, info};

use super::lock::{create_lock_table_sql, MigrationLock};
use super::registry::{Migration, MigrationRegistry};
use super::status::StatusReport;
use crate::error::{DbError, DbResult};

/// Table recording applied units
pub const LEDGER_TABLE: &str = "shellac_migrations";

/// Ledger row: exists iff the unit is considered applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub id: String,
    pub group_id: i32,
    pub applied_at: DateTime<Utc>,
}

/// The units applied, reversed, or marked together in one invocation.
///
/// Group id 0 is reserved to mean "nothing happened".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationGroup {
    pub id: i32,
    pub migrations: Vec<String>,
}

impl MigrationGroup {
    pub fn is_zero(&self) -> bool {
        self.id == 0
    }
}

impl std::fmt::Display for MigrationGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            write!(f, "group #0")
        } else {
            write!(f, "group #{} ({})", self.id, self.migrations.join(", "))
        }
    }
}

/// Whether unit actions are executed or only recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Execute,
    RecordOnly,
}

/// Orchestrator for one registry against one database
pub struct Migrator {
    pool: PgPool,
    registry: MigrationRegistry,
}

impl Migrator {
    pub fn new(pool: PgPool, registry: MigrationRegistry) -> Self {
        Self { pool, registry }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Create the ledger and lock tables.
    ///
    /// Idempotent; runs without the advisory lock because the lock table
    /// may not exist yet. An existing incompatible layout surfaces as
    /// [`DbError::Schema`].
    pub async fn init(&self) -> DbResult<()> {
        for sql in [create_ledger_table_sql(), create_lock_table_sql()] {
            sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
                DbError::Schema(format!("failed to create migration tables: {}", e))
            })?;
        }

        // Probe the expected columns so a pre-existing table with a
        // different shape fails here instead of mid-migration.
        let probes = [
            format!(
                "SELECT id, group_id, applied_at FROM {} LIMIT 0",
                LEDGER_TABLE
            ),
            format!(
                "SELECT id, holder, acquired_at FROM {} LIMIT 0",
                super::lock::LOCK_TABLE
            ),
        ];
        for sql in probes {
            sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
                DbError::Schema(format!("incompatible migration table layout: {}", e))
            })?;
        }

        debug!("migration tables ready");
        Ok(())
    }

    /// Apply all pending units in ascending identifier order.
    pub async fn migrate(&self) -> DbResult<MigrationGroup> {
        self.run_forward(Mode::Execute).await
    }

    /// Record all pending units as applied without executing them.
    pub async fn mark(&self) -> DbResult<MigrationGroup> {
        self.run_forward(Mode::RecordOnly).await
    }

    /// Reverse the last applied group in descending identifier order.
    pub async fn rollback(&self) -> DbResult<MigrationGroup> {
        self.run_backward(Mode::Execute).await
    }

    /// Delete the last group's ledger records without executing reversals.
    pub async fn unmark(&self) -> DbResult<MigrationGroup> {
        self.run_backward(Mode::RecordOnly).await
    }

    /// Read-only diff of registry against ledger.
    ///
    /// Never takes the advisory lock; a concurrent migration may produce a
    /// torn view. Callers needing a consistent snapshot must serialize
    /// externally.
    pub async fn status(&self) -> DbResult<StatusReport> {
        let records = self.fetch_records().await?;
        Ok(StatusReport::compute(&self.registry, records))
    }

    async fn run_forward(&self, mode: Mode) -> DbResult<MigrationGroup> {
        let lock = MigrationLock::acquire(&self.pool).await?;
        let result = self.apply_pending(mode).await;
        let released = lock.release(&self.pool).await;
        let group = result?;
        released?;
        Ok(group)
    }

    async fn run_backward(&self, mode: Mode) -> DbResult<MigrationGroup> {
        let lock = MigrationLock::acquire(&self.pool).await?;
        let result = self.revert_last_group(mode).await;
        let released = lock.release(&self.pool).await;
        let group = result?;
        released?;
        Ok(group)
    }

    async fn apply_pending(&self, mode: Mode) -> DbResult<MigrationGroup> {
        let applied = self.applied_ids().await?;
        let pending: Vec<&Migration> = self
            .registry
            .iter()
            .filter(|m| !applied.contains(&m.id))
            .collect();

        if pending.is_empty() {
            return Ok(MigrationGroup::default());
        }

        let group_id = self.last_group_id().await? + 1;
        let mut done = Vec::with_capacity(pending.len());

        for migration in pending {
            self.apply_one(migration, group_id, mode).await?;
            done.push(migration.id.clone());
        }

        info!(group = group_id, count = done.len(), "applied migration group");
        Ok(MigrationGroup {
            id: group_id,
            migrations: done,
        })
    }

    async fn apply_one(&self, migration: &Migration, group_id: i32, mode: Mode) -> DbResult<()> {
        debug!(id = %migration.id, ?mode, "applying migration");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| migration_failed(&migration.id, &e))?;

        if mode == Mode::Execute && !migration.up_sql.trim().is_empty() {
            (&mut *tx)
                .execute(migration.up_sql.as_str())
                .await
                .map_err(|e| migration_failed(&migration.id, &e))?;
        }

        let record_sql = format!(
            "INSERT INTO {} (id, group_id) VALUES ($1, $2)",
            LEDGER_TABLE
        );
        sqlx::query(&record_sql)
            .bind(&migration.id)
            .bind(group_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_failed(&migration.id, &e))?;

        tx.commit()
            .await
            .map_err(|e| migration_failed(&migration.id, &e))?;
        Ok(())
    }

    async fn revert_last_group(&self, mode: Mode) -> DbResult<MigrationGroup> {
        let group_id = self.last_group_id().await?;
        if group_id == 0 {
            return Ok(MigrationGroup::default());
        }

        let records = self.records_in_group(group_id).await?;
        let mut done = Vec::with_capacity(records.len());

        for record in records {
            let migration = self.registry.get(&record.id).ok_or_else(|| {
                DbError::RollbackFailed {
                    id: record.id.clone(),
                    cause: "applied migration is not present in the registry".to_string(),
                }
            })?;
            self.revert_one(migration, mode).await?;
            done.push(record.id);
        }

        info!(group = group_id, count = done.len(), "reversed migration group");
        Ok(MigrationGroup {
            id: group_id,
            migrations: done,
        })
    }

    async fn revert_one(&self, migration: &Migration, mode: Mode) -> DbResult<()> {
        debug!(id = %migration.id, ?mode, "reversing migration");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| rollback_failed(&migration.id, &e))?;

        if mode == Mode::Execute && !migration.down_sql.trim().is_empty() {
            (&mut *tx)
                .execute(migration.down_sql.as_str())
                .await
                .map_err(|e| rollback_failed(&migration.id, &e))?;
        }

        let delete_sql = format!("DELETE FROM {} WHERE id = $1", LEDGER_TABLE);
        sqlx::query(&delete_sql)
            .bind(&migration.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| rollback_failed(&migration.id, &e))?;

        tx.commit()
            .await
            .map_err(|e| rollback_failed(&migration.id, &e))?;
        Ok(())
    }

    async fn applied_ids(&self) -> DbResult<HashSet<String>> {
        let sql = format!("SELECT id FROM {}", LEDGER_TABLE);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get("id")?);
        }
        Ok(ids)
    }

    async fn last_group_id(&self) -> DbResult<i32> {
        let sql = format!("SELECT COALESCE(MAX(group_id), 0) FROM {}", LEDGER_TABLE);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    /// Records of one group, in descending identifier order.
    async fn records_in_group(&self, group_id: i32) -> DbResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, group_id, applied_at FROM {} WHERE group_id = $1 ORDER BY id DESC",
            LEDGER_TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Every ledger row, in ascending identifier order.
    pub async fn fetch_records(&self) -> DbResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, group_id, applied_at FROM {} ORDER BY id ASC",
            LEDGER_TABLE
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> DbResult<MigrationRecord> {
    Ok(MigrationRecord {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        applied_at: row.try_get("applied_at")?,
    })
}

fn migration_failed(id: &str, cause: &sqlx::Error) -> DbError {
    DbError::MigrationFailed {
        id: id.to_string(),
        cause: cause.to_string(),
    }
}

fn rollback_failed(id: &str, cause: &sqlx::Error) -> DbError {
    DbError::RollbackFailed {
        id: id.to_string(),
        cause: cause.to_string(),
    }
}

/// SQL creating the ledger table.
pub fn create_ledger_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    \
            id VARCHAR(255) PRIMARY KEY,\n    \
            group_id INTEGER NOT NULL,\n    \
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
        );",
        LEDGER_TABLE
    )
}
