use crate::config::{AppConfig, PoolTuning};
use crate::errors::ServiceError;
use anyhow::Context;
use metrics::{counter, gauge};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Opens a connection pool for `url` with the given tuning.
pub async fn connect(url: &str, tuning: &PoolTuning) -> Result<DbPool, ServiceError> {
    debug!(
        "Opening database pool (max={}, min={})",
        tuning.max_connections, tuning.min_connections
    );

    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(tuning.max_connections)
        .min_connections(tuning.min_connections)
        .connect_timeout(Duration::from_secs(tuning.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(tuning.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(tuning.idle_timeout_secs))
        .sqlx_logging(true);

    gauge!("tienda_db.max_connections", tuning.max_connections as f64);

    let pool = Database::connect(options).await.map_err(|e| {
        error!("Database connection failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database pool ready");
    Ok(pool)
}

/// Opens the pool described by `cfg`, applying pending migrations first
/// when `auto_migrate` is set.
pub async fn connect_from_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let pool = connect(&cfg.database_url, &cfg.pool).await?;
    if cfg.auto_migrate {
        run_migrations(&pool).await?;
    }
    Ok(pool)
}

/// Loads configuration and opens the pool in one step.
pub async fn create_db_pool() -> Result<DbPool, ServiceError> {
    let cfg = crate::config::load_config().context("configuration load failed")?;
    connect_from_config(&cfg).await
}

/// Applies pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    crate::migrator::Migrator::up(pool, None).await.map_err(|e| {
        error!("Migrations failed after {:?}: {}", start.elapsed(), e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Migrations completed in {:?}", start.elapsed());
    Ok(())
}

/// Pings the database, recording latency and failures.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = std::time::Instant::now();
    match pool.ping().await {
        Ok(()) => {
            let elapsed = start.elapsed();
            debug!("Database ping ok in {:?}", elapsed);
            gauge!("tienda_db.ping_latency_ms", elapsed.as_millis() as f64);
            Ok(())
        }
        Err(e) => {
            counter!("tienda_db.ping_failures", 1);
            error!("Database ping failed: {}", e);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Closes the database connection pool.
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}
