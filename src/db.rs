use crate::config::DatabaseConfig;
use crate::error::{EtlError, Result};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

/// Manager for the MySQL connection pool.
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Connect to the configured database, creating it first if absent.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to MySQL at {}:{}", config.host, config.port);

        // The target database may not exist yet, so database creation
        // goes through a short-lived server-level connection.
        let server_pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(&config.server_url())
            .await
            .map_err(|e| {
                EtlError::Persistence(format!(
                    "failed to connect to {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;

        sqlx::query(&format!("CREATE DATABASE IF NOT EXISTS {}", config.database))
            .execute(&server_pool)
            .await
            .map_err(|e| {
                EtlError::Persistence(format!(
                    "failed to create database {}: {}",
                    config.database, e
                ))
            })?;
        server_pool.close().await;

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&config.url())
            .await
            .map_err(|e| {
                EtlError::Persistence(format!(
                    "failed to connect to database {}: {}",
                    config.database, e
                ))
            })?;

        info!("Connected to database {}", config.database);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
