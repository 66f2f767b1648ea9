//! PostgreSQL/PostGIS storage adapter implementation

mod artifacts;
pub mod config;
pub mod migrations;
mod rows;

pub use config::{ConfigError, MigrationConfig, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use artmap_core::error::{ArtmapError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL storage adapter
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Connect with the given configuration and verify the connection
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| ArtmapError::BackendUnavailable {
                reason: format!("Failed to connect to database: {}", e),
            })?;

        let store = Self { pool, config };
        store.health_check().await?;
        Ok(store)
    }

    /// Connect, then apply pending migrations if the configuration asks for it
    pub async fn open(config: PostgresConfig) -> Result<Self> {
        let auto_run = config.migrations.auto_run;
        let store = Self::new(config).await?;
        if auto_run {
            store.run_migrations().await?;
        }
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone()).run_migrations().await.map_err(|e| {
            ArtmapError::BackendUnavailable { reason: format!("Migration failed: {}", e) }
        })?;

        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        MigrationManager::new(self.pool.clone())
            .check_status()
            .await
            .map_err(|e| ArtmapError::query("migration_status", e))
    }

    /// Fails with `BackendUnavailable` when the database cannot answer, or
    /// when PostGIS is not installed
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.map_err(|e| {
            ArtmapError::BackendUnavailable { reason: format!("Health check failed: {}", e) }
        })?;

        sqlx::query("SELECT PostGIS_Version()").fetch_one(&self.pool).await.map_err(|e| {
            ArtmapError::BackendUnavailable { reason: format!("PostGIS not available: {}", e) }
        })?;

        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }
}

/// Connectivity failures become `BackendUnavailable`, everything else `Query`
pub(crate) fn map_sqlx_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> ArtmapError {
    move |err| match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ArtmapError::BackendUnavailable {
            reason: format!("{} failed: {}", operation, err),
        },
        other => ArtmapError::query(operation, other),
    }
}
