//! SQLite adapters backing the orchestrator's domain ports (spec §6).

pub mod bot_repository;
pub mod campaign_repository;
pub mod connection;
pub mod kv_store;
pub mod migrations;
pub mod schedule_repository;
pub mod task_repository;

pub use bot_repository::SqliteBotRepository;
pub use campaign_repository::SqliteCampaignRepository;
pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use kv_store::SqliteKvStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use schedule_repository::SqliteScheduleRepository;
pub use task_repository::SqliteTaskRepository;

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open a pool at `database_url` and bring it up to the latest schema
/// version.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, None).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
