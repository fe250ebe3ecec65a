//! Database maintenance commands
//!
//! Thin wrappers around the shellac-db migration engine: connect, build
//! the catalog registry, run one operation, print the group outcome.

use anyhow::Result;
use shellac_db::{catalog, connect, MigrationLock, Migrator};

async fn migrator(database_url: &str) -> Result<Migrator> {
    let pool = connect(database_url).await?;
    let registry = catalog::migrations()?;
    Ok(Migrator::new(pool, registry))
}

pub async fn init(database_url: &str) -> Result<()> {
    migrator(database_url).await?.init().await?;
    Ok(())
}

pub async fn migrate(database_url: &str) -> Result<()> {
    let group = migrator(database_url).await?.migrate().await?;

    if group.is_zero() {
        println!("No new migrations to run.");
        return Ok(());
    }

    println!("Migrated to {group}");
    Ok(())
}

pub async fn rollback(database_url: &str) -> Result<()> {
    let group = migrator(database_url).await?.rollback().await?;

    if group.is_zero() {
        println!("There are no migrations to roll back.");
        return Ok(());
    }

    println!("Rolled back {group}");
    Ok(())
}

pub async fn lock(database_url: &str) -> Result<()> {
    let pool = connect(database_url).await?;
    // The guard is dropped without release: the lock row stays until an
    // explicit unlock.
    let _lock = MigrationLock::acquire(&pool).await?;
    Ok(())
}

pub async fn unlock(database_url: &str) -> Result<()> {
    let pool = connect(database_url).await?;
    MigrationLock::force_release(&pool).await?;
    Ok(())
}

pub async fn status(database_url: &str) -> Result<()> {
    let report = migrator(database_url).await?.status().await?;

    let all: Vec<String> = report.migrations.iter().map(ToString::to_string).collect();
    println!("Migrations: {}", all.join(", "));

    let unapplied: Vec<&str> = report.unapplied().iter().map(|m| m.id.as_str()).collect();
    println!("Unapplied migrations: {}", unapplied.join(", "));

    println!("Last migration group: {}", report.last_group());

    if !report.orphaned.is_empty() {
        let orphaned: Vec<&str> = report.orphaned.iter().map(|r| r.id.as_str()).collect();
        println!("Applied but not in registry: {}", orphaned.join(", "));
    }

    Ok(())
}

pub async fn mark(database_url: &str) -> Result<()> {
    let group = migrator(database_url).await?.mark().await?;

    if group.is_zero() {
        println!("No new migrations to mark.");
        return Ok(());
    }

    println!("Marked {group}");
    Ok(())
}

pub async fn unmark(database_url: &str) -> Result<()> {
    let group = migrator(database_url).await?.unmark().await?;

    if group.is_zero() {
        println!("There are no migrations to unmark.");
        return Ok(());
    }

    println!("Unmarked {group}");
    Ok(())
}
