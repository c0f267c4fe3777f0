//! # Retry Queue Processor
//!
//! Re-attempts failed outbound pushes. Each row stores the exact request to
//! repeat; this processor replays it verbatim when `next_try_at` elapses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RetryQueueProcessor                            │
//! │                                                                     │
//! │  1. Poll:   SELECT * FROM retry_queue WHERE next_try_at <= now      │
//! │             ORDER BY next_try_at LIMIT batch                        │
//! │                                                                     │
//! │  2. Replay: POST stored endpoint with stored headers + payload      │
//! │                                                                     │
//! │  3. Done:   DELETE on success                                       │
//! │             try_count + 1, next_try_at = now + min(2^n, 3600)s      │
//! │             on failure — rows are never dropped here, only aged     │
//! │             out by the housekeeper                                  │
//! │                                                                     │
//! │  TIMING: poll every 15s, batch 10 (configurable)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use bridge_core::RetryQueueItem;
use bridge_db::Database;
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::pusher::header_map;

/// Ceiling for the backoff delay.
const MAX_BACKOFF_SECS: u64 = 3600;

/// Backoff before the next attempt: `min(2^try_count, 3600)` seconds.
///
/// `try_count` is the number of attempts already recorded, so the first
/// re-attempt after a failure waits 1s, then 2s, 4s, ... capped at an hour.
pub fn retry_delay(try_count: i64) -> Duration {
    // 2^12 already exceeds the cap; clamping the exponent avoids overflow
    // for very old rows.
    let secs = if try_count >= 12 {
        MAX_BACKOFF_SECS
    } else {
        (1u64 << try_count.max(0)).min(MAX_BACKOFF_SECS)
    };
    Duration::from_secs(secs)
}

/// Background processor that replays due retry queue rows.
pub struct RetryQueueProcessor {
    db: Database,

    /// Engine configuration.
    config: Arc<SyncConfig>,

    /// HTTP client for replays.
    http: reqwest::Client,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the retry queue processor.
#[derive(Clone)]
pub struct RetryQueueProcessorHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RetryQueueProcessorHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl RetryQueueProcessor {
    /// Creates a new processor and returns a handle.
    pub fn new(
        db: Database,
        config: Arc<SyncConfig>,
    ) -> SyncResult<(Self, RetryQueueProcessorHandle)> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {e}")))?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let processor = RetryQueueProcessor {
            db,
            config,
            http,
            shutdown_rx,
        };

        Ok((processor, RetryQueueProcessorHandle { shutdown_tx }))
    }

    /// Runs the processor loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!(
            interval = ?self.config.retry_interval,
            batch = self.config.retry_batch_size,
            "Retry queue processor starting"
        );

        let mut interval = tokio::time::interval(self.config.retry_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(?e, "Retry queue cycle failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Retry queue processor shutting down");
                    break;
                }
            }
        }
    }

    /// Replays one batch of due rows.
    pub async fn run_cycle(&self) -> SyncResult<()> {
        let now = Utc::now();
        let items = self
            .db
            .retry_queue()
            .fetch_due(self.config.retry_batch_size, now)
            .await?;

        if items.is_empty() {
            return Ok(());
        }

        debug!(count = items.len(), "Replaying retry queue batch");

        for item in items {
            match self.replay(&item).await {
                Ok(status) => {
                    self.db.retry_queue().delete(&item.id).await?;
                    info!(
                        id = %item.id,
                        request_type = %item.request_type,
                        attempt = item.try_count + 1,
                        "Retry succeeded"
                    );
                    self.log_success(&item, status).await;
                }
                Err(e) => {
                    let next_try_at = Utc::now()
                        + chrono::Duration::from_std(retry_delay(item.try_count))
                            .unwrap_or(chrono::Duration::seconds(MAX_BACKOFF_SECS as i64));
                    warn!(
                        id = %item.id,
                        try_count = item.try_count,
                        %next_try_at,
                        ?e,
                        "Retry failed, backing off"
                    );
                    self.db
                        .retry_queue()
                        .record_failure(&item.id, next_try_at)
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Repeats the stored request. An unparseable row counts as a failed
    /// attempt so its backoff still grows and the housekeeper eventually
    /// removes it.
    async fn replay(&self, item: &RetryQueueItem) -> SyncResult<u16> {
        let headers = item.header_pairs()?;
        let payload: Value = serde_json::from_str(&item.payload)
            .map_err(|e| bridge_core::CoreError::invalid_payload("payload", e.to_string()))?;

        let response = self
            .http
            .post(&item.endpoint)
            .headers(header_map(&headers))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::DeliveryFailed {
                kind: item.request_type.clone(),
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::DeliveryFailed {
                kind: item.request_type.clone(),
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
            });
        }

        Ok(status.as_u16())
    }

    /// Channel audit row for a successful replay, best effort.
    async fn log_success(&self, item: &RetryQueueItem, status: u16) {
        let detail = json!({
            "endpoint": item.endpoint,
            "status": status,
            "attempt": item.try_count + 1,
        });
        if let Err(e) = self
            .db
            .logs()
            .record_channel(None, &self.config.channel, "Retry delivered", &detail)
            .await
        {
            warn!(?e, "Failed to write channel log row");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Router};
    use bridge_db::DbConfig;
    use tokio::net::TcpListener;

    #[test]
    fn test_backoff_doubles_until_cap() {
        assert_eq!(retry_delay(0), Duration::from_secs(1));
        assert_eq!(retry_delay(1), Duration::from_secs(2));
        assert_eq!(retry_delay(3), Duration::from_secs(8));
        assert_eq!(retry_delay(10), Duration::from_secs(1024));
        assert_eq!(retry_delay(12), Duration::from_secs(3600));
        assert_eq!(retry_delay(500), Duration::from_secs(3600));
        assert_eq!(retry_delay(-1), Duration::from_secs(1));
    }

    async fn serve(status: u16) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/update",
            post(move || async move {
                (axum::http::StatusCode::from_u16(status).unwrap(), "{}")
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/update")
    }

    async fn setup() -> (Database, RetryQueueProcessor) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (processor, _handle) =
            RetryQueueProcessor::new(db.clone(), Arc::new(SyncConfig::default())).unwrap();
        (db, processor)
    }

    #[tokio::test]
    async fn test_successful_replay_deletes_row_and_logs() {
        let endpoint = serve(200).await;
        let (db, processor) = setup().await;

        db.retry_queue()
            .enqueue(
                "INVENTORY",
                &endpoint,
                &json!({"updates": []}),
                &json!({"Authorization": "Basic abc"}),
            )
            .await
            .unwrap();

        processor.run_cycle().await.unwrap();

        assert!(db.retry_queue().fetch_due(10, Utc::now()).await.unwrap().is_empty());

        let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channel_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(logs, 1);
    }

    #[tokio::test]
    async fn test_failed_replay_backs_off() {
        let endpoint = serve(503).await;
        let (db, processor) = setup().await;

        let item = db
            .retry_queue()
            .enqueue("RATES", &endpoint, &json!({}), &json!({}))
            .await
            .unwrap();

        let before = Utc::now();
        processor.run_cycle().await.unwrap();

        // Row survives with try_count bumped and next_try_at ~1s out
        // (first failure backs off by 2^0).
        let rows = db
            .retry_queue()
            .fetch_due(10, Utc::now() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, item.id);
        assert_eq!(rows[0].try_count, 1);
        assert!(rows[0].next_try_at >= before + chrono::Duration::seconds(1));
        assert!(rows[0].next_try_at <= Utc::now() + chrono::Duration::seconds(2));

        // Not due again immediately.
        assert!(db.retry_queue().fetch_due(10, before).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_row_counts_as_attempt() {
        let (db, processor) = setup().await;

        // Corrupt headers JSON directly; enqueue always writes valid JSON.
        let item = db
            .retry_queue()
            .enqueue("INVENTORY", "http://127.0.0.1:1/none", &json!({}), &json!({}))
            .await
            .unwrap();
        sqlx::query("UPDATE retry_queue SET headers = 'not json' WHERE id = ?1")
            .bind(&item.id)
            .execute(db.pool())
            .await
            .unwrap();

        processor.run_cycle().await.unwrap();

        let rows = db
            .retry_queue()
            .fetch_due(10, Utc::now() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(rows[0].try_count, 1);
    }
}
