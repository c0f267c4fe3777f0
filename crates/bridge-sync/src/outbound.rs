//! # Sync Queue Processor
//!
//! Drains the outbound sync queue and delivers each item to the channel
//! manager.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SyncQueueProcessor                             │
//! │                                                                     │
//! │  1. Poll:   SELECT * FROM sync_queue WHERE status = 'PENDING'       │
//! │             ORDER BY created_at LIMIT batch                         │
//! │                                                                     │
//! │  2. Claim:  UPDATE status = 'PROCESSING'                            │
//! │                                                                     │
//! │  3. Build:  room_id → external code, payload → update envelope      │
//! │                                                                     │
//! │  4. Push:   POST {base}/v2/cm/update/{api_user}                     │
//! │                                                                     │
//! │  5. Done:   DELETE on success                                       │
//! │             FAILED + retry_count on error, and delivery errors      │
//! │             additionally land a row in the retry queue              │
//! │                                                                     │
//! │  TIMING: poll every 10s, batch 10 (configurable)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are contained per item: one bad row is marked FAILED and the
//! rest of the batch proceeds.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use bridge_core::{build_update, SyncQueueItem};
use bridge_db::Database;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::pusher::ChannelPusher;

/// Background processor that delivers pending sync queue items.
pub struct SyncQueueProcessor {
    db: Database,

    /// Engine configuration.
    config: Arc<SyncConfig>,

    /// Shared delivery client.
    pusher: ChannelPusher,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the sync queue processor.
#[derive(Clone)]
pub struct SyncQueueProcessorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SyncQueueProcessorHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl SyncQueueProcessor {
    /// Creates a new processor and returns a handle.
    pub fn new(
        db: Database,
        config: Arc<SyncConfig>,
        pusher: ChannelPusher,
    ) -> (Self, SyncQueueProcessorHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let processor = SyncQueueProcessor {
            db,
            config,
            pusher,
            shutdown_rx,
        };

        (processor, SyncQueueProcessorHandle { shutdown_tx })
    }

    /// Runs the processor loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!(
            interval = ?self.config.sync_interval,
            batch = self.config.sync_batch_size,
            "Sync queue processor starting"
        );

        let mut interval = tokio::time::interval(self.config.sync_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(?e, "Sync queue cycle failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Sync queue processor shutting down");
                    break;
                }
            }
        }
    }

    /// Drains one batch of PENDING items. Per-item errors are recorded on
    /// the row; only batch-level failures (the poll itself) escalate.
    pub async fn run_cycle(&self) -> SyncResult<()> {
        let items = self
            .db
            .sync_queue()
            .fetch_pending(self.config.sync_batch_size)
            .await?;

        if items.is_empty() {
            return Ok(());
        }

        debug!(count = items.len(), "Draining sync queue batch");

        for item in items {
            self.db.sync_queue().mark_processing(&item.id).await?;

            match self.deliver(&item).await {
                Ok(()) => {
                    self.db.sync_queue().delete(&item.id).await?;
                    info!(id = %item.id, kind = %item.kind, "Sync item delivered");
                }
                Err(e) => {
                    warn!(id = %item.id, kind = %item.kind, ?e, "Sync item failed");
                    self.db
                        .sync_queue()
                        .mark_failed(&item.id, &e.to_string())
                        .await?;

                    if e.is_retryable() {
                        self.enqueue_retry(&item).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Builds the update envelope for one item and pushes it.
    async fn deliver(&self, item: &SyncQueueItem) -> SyncResult<()> {
        let room_code = self
            .db
            .mappings()
            .to_external(item.room_id)
            .await?
            .ok_or_else(|| {
                SyncError::Core(bridge_core::CoreError::MappingNotFound(format!(
                    "room id {}",
                    item.room_id
                )))
            })?;

        let payload = item.payload_json()?;
        let envelope = build_update(
            item.kind,
            &room_code,
            item.start_date,
            item.end_date,
            &payload,
        )?;

        let body = serde_json::to_value(&envelope)
            .map_err(|e| bridge_core::CoreError::invalid_payload("updates", e.to_string()))?;

        self.pusher.push(&body, item.kind).await?;
        Ok(())
    }

    /// Hands a delivery failure to the retry queue. Failures here are
    /// logged, not escalated: the sync row already carries the FAILED state.
    async fn enqueue_retry(&self, item: &SyncQueueItem) {
        let parts = match self.pusher.request_parts().await {
            Ok(parts) => parts,
            Err(e) => {
                warn!(id = %item.id, ?e, "Could not build retry request");
                return;
            }
        };
        let (endpoint, headers) = parts;

        let room_code = match self.db.mappings().to_external(item.room_id).await {
            Ok(Some(code)) => code,
            _ => return,
        };
        let payload = match item.payload_json() {
            Ok(payload) => payload,
            Err(_) => return,
        };
        let envelope =
            match build_update(item.kind, &room_code, item.start_date, item.end_date, &payload) {
                Ok(envelope) => envelope,
                Err(_) => return,
            };
        let body = match serde_json::to_value(&envelope) {
            Ok(body) => body,
            Err(_) => return,
        };

        match self
            .db
            .retry_queue()
            .enqueue(&item.kind.to_string(), &endpoint, &body, &headers)
            .await
        {
            Ok(retry) => debug!(sync_id = %item.id, retry_id = %retry.id, "Queued for retry"),
            Err(e) => warn!(id = %item.id, ?e, "Failed to enqueue retry"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
