//! Postgres pool and migrations backing [`crate::store::PgStore`]

use crate::config::DatabaseConfig;
use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const APPLICATION_NAME: &str = "fitness-coach";

/// Connections kept warm for the delivery loop and the webhook
const MIN_CONNECTIONS: u32 = 2;

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    Ok(PgConnectOptions::from_str(&config.url)?.application_name(APPLICATION_NAME))
}

/// Open the pool described by `[database]`
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let min_connections = MIN_CONNECTIONS.min(config.max_connections);
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect_with(connect_options(config)?)
        .await?;

    info!(
        max_connections = config.max_connections,
        min_connections, "Database pool created"
    );
    Ok(pool)
}

/// Apply the embedded schema for users, activities, completions and reminders
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            warn!(error = %e, "Database health check failed");
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_database_url() {
        let config = DatabaseConfig {
            url: "not a database url".to_string(),
            max_connections: 4,
        };
        assert!(connect_options(&config).is_err());
    }

    #[test]
    fn test_accepts_configured_database_url() {
        let config = crate::config::AppConfig::default().database;
        assert!(connect_options(&config).is_ok());
    }
}
