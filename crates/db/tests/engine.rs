//! Migration engine integration tests
//!
//! These run against a real PostgreSQL instance (DATABASE_URL, falling
//! back to the local development endpoint) and are ignored by default.

use serial_test::serial;
use sqlx::{PgPool, Row};

use shellac_db::{
    connect, DbError, Migration, MigrationLock, MigrationRegistry, Migrator, DEFAULT_DATABASE_URL,
};

async fn test_pool() -> PgPool {
    let url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    connect(&url).await.expect("failed to connect to test database")
}

/// Drop engine tables and any tables test registries create.
async fn reset(pool: &PgPool) {
    for table in [
        "shellac_migrations",
        "shellac_migration_lock",
        "mig_a",
        "mig_b",
        "mig_c",
        "mig_broken",
    ] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
            .execute(pool)
            .await
            .expect("reset failed");
    }
}

async fn table_exists(pool: &PgPool, name: &str) -> bool {
    let row = sqlx::query(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name = $1",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("table_exists query failed");
    row.get::<i64, _>(0) > 0
}

fn registry_abc() -> MigrationRegistry {
    MigrationRegistry::from_units(vec![
        Migration::new(
            "20240101_000000_a",
            "CREATE TABLE mig_a (id INTEGER);",
            "DROP TABLE mig_a;",
        ),
        Migration::new(
            "20240102_000000_b",
            "CREATE TABLE mig_b (id INTEGER);",
            "DROP TABLE mig_b;",
        ),
        Migration::new(
            "20240103_000000_c",
            "CREATE TABLE mig_c (id INTEGER);",
            "DROP TABLE mig_c;",
        ),
    ])
    .unwrap()
}

async fn fresh_migrator(pool: &PgPool, registry: MigrationRegistry) -> Migrator {
    reset(pool).await;
    let migrator = Migrator::new(pool.clone(), registry);
    migrator.init().await.expect("init failed");
    migrator
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn init_is_idempotent() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;
    migrator.init().await.expect("second init failed");
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn migrate_twice_yields_group_zero() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;

    let first = migrator.migrate().await.unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.migrations.len(), 3);

    let second = migrator.migrate().await.unwrap();
    assert!(second.is_zero());
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn migrate_then_rollback_round_trips() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;

    let group = migrator.migrate().await.unwrap();
    assert_eq!(
        group.migrations,
        vec!["20240101_000000_a", "20240102_000000_b", "20240103_000000_c"]
    );
    assert!(table_exists(&pool, "mig_c").await);

    let reversed = migrator.rollback().await.unwrap();
    assert_eq!(reversed.id, 1);
    // Reversal runs in descending identifier order.
    assert_eq!(
        reversed.migrations,
        vec!["20240103_000000_c", "20240102_000000_b", "20240101_000000_a"]
    );

    let report = migrator.status().await.unwrap();
    assert_eq!(report.unapplied().len(), 3);
    assert!(report.last_group().is_zero());
    assert!(!table_exists(&pool, "mig_a").await);

    let empty = migrator.rollback().await.unwrap();
    assert!(empty.is_zero());
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn mark_and_unmark_touch_only_the_ledger() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;

    let marked = migrator.mark().await.unwrap();
    assert_eq!(marked.id, 1);
    assert_eq!(marked.migrations.len(), 3);
    // Forward actions were never executed.
    assert!(!table_exists(&pool, "mig_a").await);

    // Marked units count as fully applied.
    let group = migrator.migrate().await.unwrap();
    assert!(group.is_zero());

    let unmarked = migrator.unmark().await.unwrap();
    assert_eq!(unmarked.id, 1);

    let report = migrator.status().await.unwrap();
    assert_eq!(report.unapplied().len(), 3);

    let empty = migrator.unmark().await.unwrap();
    assert!(empty.is_zero());
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn failing_unit_stops_the_invocation() {
    let pool = test_pool().await;
    let registry = MigrationRegistry::from_units(vec![
        Migration::new(
            "20240101_000000_a",
            "CREATE TABLE mig_a (id INTEGER);",
            "DROP TABLE mig_a;",
        ),
        Migration::new(
            "20240102_000000_broken",
            // Fails on the second statement; the unit's transaction rolls
            // back as a whole.
            "CREATE TABLE mig_broken (id INTEGER); \
             INSERT INTO table_that_does_not_exist VALUES (1);",
            "DROP TABLE mig_broken;",
        ),
        Migration::new(
            "20240103_000000_c",
            "CREATE TABLE mig_c (id INTEGER);",
            "DROP TABLE mig_c;",
        ),
    ])
    .unwrap();
    let migrator = fresh_migrator(&pool, registry).await;

    let err = migrator.migrate().await.unwrap_err();
    match err {
        DbError::MigrationFailed { id, .. } => assert_eq!(id, "20240102_000000_broken"),
        other => panic!("unexpected error: {other:?}"),
    }

    // Earlier units stay applied, the failing unit left no trace, later
    // units were never attempted.
    assert!(table_exists(&pool, "mig_a").await);
    assert!(!table_exists(&pool, "mig_broken").await);
    assert!(!table_exists(&pool, "mig_c").await);

    let report = migrator.status().await.unwrap();
    assert!(report.migrations[0].is_applied());
    assert!(!report.migrations[1].is_applied());
    assert!(!report.migrations[2].is_applied());

    // The lock was released on the failure path.
    let lock = MigrationLock::acquire(&pool).await.unwrap();
    lock.release(&pool).await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn concurrent_acquires_admit_exactly_one_holder() {
    let pool = test_pool().await;
    let _migrator = fresh_migrator(&pool, registry_abc()).await;

    let (first, second) = tokio::join!(
        MigrationLock::acquire(&pool),
        MigrationLock::acquire(&pool)
    );

    let (winner, loser) = match (first, second) {
        (Ok(lock), Err(err)) => (lock, err),
        (Err(err), Ok(lock)) => (lock, err),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert!(matches!(loser, DbError::LockHeld));

    winner.release(&pool).await.unwrap();

    // Released, the lock is free again.
    let reacquired = MigrationLock::acquire(&pool).await.unwrap();
    reacquired.release(&pool).await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn held_lock_blocks_migrate() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;

    let lock = MigrationLock::acquire(&pool).await.unwrap();
    let err = migrator.migrate().await.unwrap_err();
    assert!(matches!(err, DbError::LockHeld));

    // Nothing touched the ledger while locked out.
    let report = migrator.status().await.unwrap();
    assert_eq!(report.unapplied().len(), 3);

    lock.release(&pool).await.unwrap();
    let group = migrator.migrate().await.unwrap();
    assert_eq!(group.id, 1);
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn force_release_recovers_an_abandoned_lock() {
    let pool = test_pool().await;
    let migrator = fresh_migrator(&pool, registry_abc()).await;

    // Simulate an interrupted process: acquire and never release.
    let abandoned = MigrationLock::acquire(&pool).await.unwrap();
    std::mem::drop(abandoned);

    assert!(matches!(
        MigrationLock::acquire(&pool).await.unwrap_err(),
        DbError::LockHeld
    ));

    MigrationLock::force_release(&pool).await.unwrap();
    // Idempotent when nothing is held.
    MigrationLock::force_release(&pool).await.unwrap();

    let group = migrator.migrate().await.unwrap();
    assert_eq!(group.id, 1);
}

#[tokio::test]
#[serial]
#[ignore] // Requires a PostgreSQL server
async fn groups_increase_monotonically() {
    let pool = test_pool().await;
    let registry = MigrationRegistry::from_units(vec![Migration::new(
        "20240101_000000_a",
        "CREATE TABLE mig_a (id INTEGER);",
        "DROP TABLE mig_a;",
    )])
    .unwrap();
    let migrator = fresh_migrator(&pool, registry).await;

    assert_eq!(migrator.migrate().await.unwrap().id, 1);

    // A later unit lands in a new group.
    let mut extended = MigrationRegistry::new();
    extended
        .register(Migration::new(
            "20240101_000000_a",
            "CREATE TABLE mig_a (id INTEGER);",
            "DROP TABLE mig_a;",
        ))
        .unwrap();
    extended
        .register(Migration::new(
            "20240102_000000_b",
            "CREATE TABLE mig_b (id INTEGER);",
            "DROP TABLE mig_b;",
        ))
        .unwrap();
    let migrator = Migrator::new(pool.clone(), extended);

    let group = migrator.migrate().await.unwrap();
    assert_eq!(group.id, 2);
    assert_eq!(group.migrations, vec!["20240102_000000_b"]);

    // Rollback reverses only the most recent group.
    let reversed = migrator.rollback().await.unwrap();
    assert_eq!(reversed.id, 2);
    assert!(table_exists(&pool, "mig_a").await);
    assert!(!table_exists(&pool, "mig_b").await);
}
