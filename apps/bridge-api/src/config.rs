//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Engine-side settings (intervals, retention) live in
//! [`bridge_sync::SyncConfig`]; this covers the HTTP surface and storage.

use std::env;

/// HTTP service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file path
    pub database_path: String,

    /// Shared secret expected in the x-webhook-token header. Unset means
    /// the webhook accepts unauthenticated deliveries.
    pub webhook_secret: Option<String>,

    /// Key expected in x-api-key on the internal sync endpoints
    pub internal_api_key: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "bridge.db".to_string()),

            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),

            internal_api_key: env::var("INTERNAL_API_KEY")
                .map_err(|_| ConfigError::MissingRequired("INTERNAL_API_KEY".to_string()))?,
        };

        if config.internal_api_key.is_empty() {
            return Err(ConfigError::InvalidValue("INTERNAL_API_KEY".to_string()));
        }

        Ok(config)
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
