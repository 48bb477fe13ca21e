//! Test utilities for the `PostgreSQL` backend.
//!
//! Integration tests that need a live database use [`TestDatabase`]; the
//! connection parameters come from `TEST_DB_*` environment variables.

use std::sync::Arc;

use crate::migrations::Migrator;
use crate::repositories::{CommentRepository, ReactionRepository};
use crate::store::{CommentStore, ReactionStore};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Tables owned by this crate, in truncation order.
const TABLES: [&str; 2] = ["reaction", "comment"];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |key: &str, fallback: &str| std::env::var(key).unwrap_or_else(|_| fallback.to_string());
        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: var("TEST_DB_USER", "colloquy_test"),
            password: var("TEST_DB_PASSWORD", "colloquy_test"),
            database: var("TEST_DB_NAME", "colloquy_test"),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Connect using [`TestDbConfig::default`], run migrations, and start
    /// from empty tables.
    pub async fn connect() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;
        info!(database = %config.database, "Connected to test database");

        let db = Self {
            conn: Arc::new(conn),
        };
        db.cleanup().await?;
        Ok(db)
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Repository-backed stores sharing this connection.
    #[must_use]
    pub fn stores(&self) -> (CommentStore, ReactionStore) {
        (
            Arc::new(CommentRepository::new(self.connection())),
            Arc::new(ReactionRepository::new(self.connection())),
        )
    }

    /// Remove all comments and reactions.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in TABLES {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\""),
                ))
                .await?;
        }
        Ok(())
    }
}
