//! Holocron DB - the local SQLite mirror and the sync pipeline that fills it.
//!
//! - [`upsert`] - find-or-create by natural key, relationship replacement
//! - [`resolver`] - external URL → local id maps
//! - [`coordinator`] - one transactional sync run
//! - [`repository`] - read queries over the synced store

pub mod coordinator;
pub mod repository;
pub mod resolver;
pub mod upsert;

use std::str::FromStr;

use holocron_core::config::DbConfig;
use holocron_core::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub use coordinator::SyncCoordinator;
pub use repository::CatalogRepository;
pub use resolver::{ReferenceMap, Resolved};
pub use upsert::{Relation, StageResult};

/// Opens (creating if needed) the database at `database_url` and applies migrations.
pub async fn connect(database_url: &str, config: &DbConfig) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool is
/// pinned to one connection that never expires.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::MigrationError(e.to_string()))
}
