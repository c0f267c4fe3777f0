//! # Supervisor
//!
//! Owns the lifecycle of the three periodic tasks: validates configuration,
//! spawns the sync queue processor, the retry queue processor and the
//! housekeeper, and shuts them down together.

use std::sync::Arc;
use tracing::info;

use bridge_db::Database;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::housekeeper::{Housekeeper, HousekeeperHandle};
use crate::outbound::{SyncQueueProcessor, SyncQueueProcessorHandle};
use crate::pusher::ChannelPusher;
use crate::retry::{RetryQueueProcessor, RetryQueueProcessorHandle};

/// Lifecycle owner for the background tasks.
pub struct Supervisor {
    db: Database,
    config: Arc<SyncConfig>,

    sync_handle: Option<SyncQueueProcessorHandle>,
    retry_handle: Option<RetryQueueProcessorHandle>,
    housekeeper_handle: Option<HousekeeperHandle>,
}

impl Supervisor {
    /// Creates a supervisor. Nothing runs until [`Supervisor::start`].
    pub fn new(db: Database, config: SyncConfig) -> Self {
        Supervisor {
            db,
            config: Arc::new(config),
            sync_handle: None,
            retry_handle: None,
            housekeeper_handle: None,
        }
    }

    /// Validates configuration and spawns the background tasks.
    pub fn start(&mut self) -> SyncResult<()> {
        self.config.validate()?;

        let pusher = ChannelPusher::new(self.db.clone(), self.config.clone())?;

        let (sync, sync_handle) =
            SyncQueueProcessor::new(self.db.clone(), self.config.clone(), pusher);
        tokio::spawn(sync.run());
        self.sync_handle = Some(sync_handle);

        let (retry, retry_handle) =
            RetryQueueProcessor::new(self.db.clone(), self.config.clone())?;
        tokio::spawn(retry.run());
        self.retry_handle = Some(retry_handle);

        let (housekeeper, housekeeper_handle) =
            Housekeeper::new(self.db.clone(), self.config.clone());
        tokio::spawn(housekeeper.run());
        self.housekeeper_handle = Some(housekeeper_handle);

        info!(channel = %self.config.channel, "Background tasks started");
        Ok(())
    }

    /// Signals every running task to stop.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.sync_handle.take() {
            handle.shutdown().await;
        }
        if let Some(handle) = self.retry_handle.take() {
            handle.shutdown().await;
        }
        if let Some(handle) = self.housekeeper_handle.take() {
            handle.shutdown().await;
        }

        info!("Background tasks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_db::DbConfig;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut supervisor = Supervisor::new(db, SyncConfig::default());

        supervisor.start().unwrap();
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = SyncConfig {
            sync_batch_size: 0,
            ..SyncConfig::default()
        };
        let mut supervisor = Supervisor::new(db, config);

        assert!(supervisor.start().is_err());
    }
}
