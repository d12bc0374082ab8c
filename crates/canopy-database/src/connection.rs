//! PostgreSQL pool for the folder and grant repositories.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use canopy_core::config::database::DatabaseConfig;
use canopy_core::error::{AppError, ErrorKind};
use canopy_core::result::AppResult;

const APPLICATION_NAME: &str = "canopy";

/// Shared sqlx pool, migrated before first use.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect with the pool limits from `config` and apply pending
    /// migrations.
    ///
    /// A URL that cannot be parsed is a `Configuration` error. Failing to
    /// reach the server or to migrate is a `Database` error.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = connect_options(&config.url)?;
        info!(
            target = %describe_target(&options),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        crate::migration::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying sqlx pool, for building repositories.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Whether the server answers a trivial query.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

fn connect_options(url: &str) -> AppResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(url).map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Invalid database URL: {e}"),
            e,
        )
    })?;
    Ok(options.application_name(APPLICATION_NAME))
}

/// `host:port/database` for log lines. Credentials never appear.
fn describe_target(options: &PgConnectOptions) -> String {
    match options.get_database() {
        Some(db) => format!("{}:{}/{db}", options.get_host(), options.get_port()),
        None => format!("{}:{}", options.get_host(), options.get_port()),
    }
}
