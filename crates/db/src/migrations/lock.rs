//! Lock Manager - database-resident mutual exclusion
//!
//! A single advisory row inside the target database coordinates mutating
//! operations across independent processes (concurrent deploy pipelines
//! are the expected contention scenario). A process that dies mid-run
//! leaves the row in place; `force_release` backs the manual `unlock`
//! command used for recovery.

use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Table holding the singleton lock row
pub const LOCK_TABLE: &str = "shellac_migration_lock";

/// An acquired migration lock, identified by its holder token
#[derive(Debug)]
pub struct MigrationLock {
    holder: Uuid,
}

impl MigrationLock {
    /// Attempt to take the exclusive lock.
    ///
    /// Fails with [`DbError::LockHeld`] when another holder is active and
    /// [`DbError::LockBackend`] on a backend fault.
    pub async fn acquire(pool: &PgPool) -> DbResult<Self> {
        let holder = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {} (id, holder, acquired_at) VALUES (1, $1, now()) \
             ON CONFLICT (id) DO NOTHING",
            LOCK_TABLE
        );

        let result = sqlx::query(&sql)
            .bind(holder)
            .execute(pool)
            .await
            .map_err(DbError::LockBackend)?;

        if result.rows_affected() == 0 {
            return Err(DbError::LockHeld);
        }

        debug!(%holder, "acquired migration lock");
        Ok(Self { holder })
    }

    pub fn holder(&self) -> Uuid {
        self.holder
    }

    /// Release the lock held by this invocation.
    ///
    /// Releasing when no lock row exists is a no-op success; a row held by
    /// a different token yields [`DbError::LockNotHeld`].
    pub async fn release(self, pool: &PgPool) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = 1 AND holder = $1", LOCK_TABLE);
        let result = sqlx::query(&sql)
            .bind(self.holder)
            .execute(pool)
            .await
            .map_err(DbError::LockBackend)?;

        if result.rows_affected() == 0 {
            let check = format!("SELECT holder FROM {} WHERE id = 1", LOCK_TABLE);
            let row = sqlx::query(&check)
                .fetch_optional(pool)
                .await
                .map_err(DbError::LockBackend)?;
            if row.is_some() {
                warn!(holder = %self.holder, "lock row belongs to a different holder");
                return Err(DbError::LockNotHeld);
            }
        }

        debug!(holder = %self.holder, "released migration lock");
        Ok(())
    }

    /// Delete the lock row regardless of holder.
    ///
    /// Operational recovery after an interrupted process; succeeds even
    /// when no lock is held.
    pub async fn force_release(pool: &PgPool) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = 1", LOCK_TABLE);
        let result = sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(DbError::LockBackend)?;

        if result.rows_affected() > 0 {
            debug!("force-released migration lock");
        }
        Ok(())
    }
}

/// SQL creating the lock table; `id` is fixed at 1 so the advisory row is
/// a singleton.
pub fn create_lock_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    \
            id INTEGER PRIMARY KEY CHECK (id = 1),\n    \
            holder UUID NOT NULL,\n    \
            acquired_at TIMESTAMPTZ NOT NULL DEFAULT now()\n\
        );",
        LOCK_TABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_table_sql_is_singleton() {
        let sql = create_lock_table_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS shellac_migration_lock"));
        assert!(sql.contains("CHECK (id = 1)"));
        assert!(sql.contains("holder UUID NOT NULL"));
    }
}
