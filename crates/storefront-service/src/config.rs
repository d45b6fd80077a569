//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Maximum connections in the pool
    pub max_connections: u32,

    /// Whether to run migrations on startup
    pub run_migrations: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = ServiceConfig {
            database_path: env::var("STOREFRONT_DATABASE_PATH")
                .unwrap_or_else(|_| "./storefront.db".to_string())
                .into(),

            max_connections: env::var("STOREFRONT_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOREFRONT_MAX_CONNECTIONS".to_string()))?,

            run_migrations: env::var("STOREFRONT_RUN_MIGRATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "STOREFRONT_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("./storefront.db"),
            max_connections: 5,
            run_migrations: true,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
