//! # Brigada DB
//!
//! PostgreSQL pool initialisation and the embedded schema migrations.
//!
//! ```ignore
//! use brigada_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool().await?;
//! run_migrations(&pool).await?;
//! ```

use std::env;
use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Migrations under the workspace `migrations/` directory, embedded at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS` (default 10).
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            url: env::var("DATABASE_URL")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            acquire_timeout: Duration::from_secs(5),
        })
    }
}

/// Connects a pool using [`DatabaseConfig::from_env`]. A missing
/// `DATABASE_URL` is reported as a configuration error.
pub async fn init_db_pool() -> Result<PgPool, sqlx::Error> {
    let config = DatabaseConfig::from_env()
        .map_err(|e| sqlx::Error::Configuration(format!("DATABASE_URL: {}", e).into()))?;
    connect(&config).await
}

pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(max_connections = config.max_connections, "connecting to database");

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Round-trips a trivial query; used by the health endpoint.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}
