use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub type DbPool = DatabaseConnection;

/// Pool sizing and timeouts, taken from [`AppConfig`]
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl From<&AppConfig> for PoolSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections.min(cfg.db_max_connections),
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

impl PoolSettings {
    fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .sqlx_logging(false);
        opt
    }
}

/// Opens the pool described by `settings`
///
/// # Errors
/// Returns `ServiceError::DatabaseError` if the database cannot be reached
pub async fn connect(settings: &PoolSettings) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        "opening database pool"
    );
    gauge!("storefront_db.max_connections", settings.max_connections as f64);

    let pool = Database::connect(settings.connect_options())
        .await
        .map_err(|e| {
            error!("Database connection failed: {}", e);
            ServiceError::DatabaseError(e)
        })?;

    info!(
        backend = ?pool.get_database_backend(),
        "Database pool ready"
    );
    Ok(pool)
}

pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    connect(&PoolSettings::from(cfg)).await
}

/// Applies pending schema migrations and the catalog seed
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();
    crate::migrator::Migrator::up(pool, None).await.map_err(|e| {
        error!(elapsed = ?start.elapsed(), "Migrations failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!(elapsed = ?start.elapsed(), "Migrations applied");
    Ok(())
}

/// Round-trip ping used by the readiness endpoint
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();

    match pool.ping().await {
        Ok(()) => {
            histogram!("storefront_db.ping_latency", start.elapsed());
            Ok(())
        }
        Err(e) => {
            counter!("storefront_db.ping_failures", 1);
            error!(elapsed = ?start.elapsed(), "Database ping failed: {}", e);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    }

    #[test]
    fn pool_settings_follow_app_config() {
        let mut app = app_config();
        app.db_max_connections = 4;
        app.db_min_connections = 9;
        app.db_acquire_timeout_secs = 3;

        let settings = PoolSettings::from(&app);
        assert_eq!(settings.url, "sqlite::memory:");
        assert_eq!(settings.max_connections, 4);
        // never more idle connections than the pool can hold
        assert_eq!(settings.min_connections, 4);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn migrations_run_against_in_memory_sqlite() {
        let mut app = app_config();
        app.db_max_connections = 1;
        app.db_min_connections = 1;

        let pool = establish_connection_from_app_config(&app).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(check_connection(&pool).await.is_ok());
    }
}
