//! Database connection handling
//!
//! This module provides functionality to establish and release database connections.

use std::time::Duration;

use sqlx::{mysql::MySqlPoolOptions, postgres::PgPoolOptions, MySql, Pool, Postgres};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Enumeration of supported database types
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
}

impl DatabaseConnection {
    /// Open a single-connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS));
        let connection_error =
            |e: sqlx::Error| Error::ConnectionError(format!("{} database: {}", config.driver, e));

        match config.driver.as_str() {
            "postgres" => {
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await
                    .map_err(connection_error)?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            "mysql" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await
                    .map_err(connection_error)?;

                Ok(DatabaseConnection::MySql(pool))
            }
            _ => Err(Error::ConnectionError(format!(
                "Unsupported database driver: {}",
                config.driver
            ))),
        }
    }

    /// Close the pool, waiting for the connection to be released
    pub async fn close(self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
        }
    }
}
