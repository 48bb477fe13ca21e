//! Storage layer for colloquy.
//!
//! - **Entities**: sea-orm models for comments and reactions
//! - **Store**: the [`DocumentStore`](store::DocumentStore) adapter trait and
//!   its in-memory and retrying implementations
//! - **Repositories**: `PostgreSQL` implementations of the adapter
//! - **Migrations**: schema for the `PostgreSQL` backend

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod store;
pub mod test_utils;

use colloquy_common::{AppError, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.url);

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::StoreUnavailable(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
