//! # Sync Engine Configuration
//!
//! Loaded from environment variables with defaults, like the rest of the
//! service's process configuration. Intervals and batch sizes control the
//! three periodic tasks; retention windows control the housekeeper.

use std::env;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Configuration for the reconciliation and delivery engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Channel name used to look up credentials in channel_settings.
    pub channel: String,

    /// Channel manager API base URL (no trailing slash).
    pub base_url: String,

    /// Sync queue drain interval. Default: 10s.
    pub sync_interval: Duration,

    /// Max sync queue items per cycle. Default: 10.
    pub sync_batch_size: u32,

    /// Retry queue drain interval. Default: 15s.
    pub retry_interval: Duration,

    /// Max retry queue items per cycle. Default: 10.
    pub retry_batch_size: u32,

    /// Housekeeping interval. Default: 24h.
    pub housekeeping_interval: Duration,

    /// Timeout for every outbound HTTP call. Default: 15s.
    pub http_timeout: Duration,

    /// Webhook log retention. Default: 30 days.
    pub webhook_log_retention_days: i64,

    /// Retry queue row retention, regardless of outcome. Default: 7 days.
    pub retry_retention_days: i64,

    /// FAILED sync queue row retention. Default: 7 days.
    pub failed_sync_retention_days: i64,

    /// The queue tables have no row leasing, so each must have exactly one
    /// consumer. This flag makes that deployment assumption explicit;
    /// validate() refuses anything else.
    pub single_instance: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            channel: "channel_manager".to_string(),
            base_url: "https://live.aiosell.com/api".to_string(),
            sync_interval: Duration::from_secs(10),
            sync_batch_size: 10,
            retry_interval: Duration::from_secs(15),
            retry_batch_size: 10,
            housekeeping_interval: Duration::from_secs(24 * 60 * 60),
            http_timeout: Duration::from_secs(15),
            webhook_log_retention_days: 30,
            retry_retention_days: 7,
            failed_sync_retention_days: 7,
            single_instance: true,
        }
    }
}

impl SyncConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> SyncResult<Self> {
        let defaults = SyncConfig::default();

        let config = SyncConfig {
            channel: env::var("CHANNEL_NAME").unwrap_or(defaults.channel),
            base_url: env::var("CHANNEL_BASE_URL")
                .unwrap_or(defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            sync_interval: Duration::from_secs(env_u64("SYNC_INTERVAL_SECS", 10)?),
            sync_batch_size: env_u64("SYNC_BATCH_SIZE", 10)? as u32,
            retry_interval: Duration::from_secs(env_u64("RETRY_INTERVAL_SECS", 15)?),
            retry_batch_size: env_u64("RETRY_BATCH_SIZE", 10)? as u32,
            housekeeping_interval: Duration::from_secs(env_u64(
                "HOUSEKEEPING_INTERVAL_SECS",
                24 * 60 * 60,
            )?),
            http_timeout: Duration::from_secs(env_u64("CHANNEL_HTTP_TIMEOUT_SECS", 15)?),
            webhook_log_retention_days: env_u64("WEBHOOK_LOG_RETENTION_DAYS", 30)? as i64,
            retry_retention_days: env_u64("RETRY_RETENTION_DAYS", 7)? as i64,
            failed_sync_retention_days: env_u64("FAILED_SYNC_RETENTION_DAYS", 7)? as i64,
            single_instance: env::var("SINGLE_INSTANCE")
                .map(|v| v != "false")
                .unwrap_or(true),
        };

        Ok(config)
    }

    /// Validates the configuration before the supervisor starts tasks.
    pub fn validate(&self) -> SyncResult<()> {
        if self.base_url.is_empty() {
            return Err(SyncError::InvalidConfig("base_url must not be empty".into()));
        }

        if self.sync_batch_size == 0 || self.retry_batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "batch sizes must be at least 1".into(),
            ));
        }

        if !self.single_instance {
            // Queue rows have no lease/owner column; two drains of the same
            // table would double-deliver.
            return Err(SyncError::InvalidConfig(
                "multi-instance operation is unsupported: queue tables have no row leasing".into(),
            ));
        }

        Ok(())
    }
}

fn env_u64(name: &str, default: u64) -> SyncResult<u64> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| SyncError::InvalidConfig(format!("{name} must be an integer, got '{raw}'"))),
    }
}
