//! # Housekeeper
//!
//! Periodic pruning of aged rows so the operational tables stay bounded:
//!
//!   webhook_logs   older than 30 days
//!   retry_queue    older than 7 days, delivered or not
//!   sync_queue     FAILED rows older than 7 days
//!
//! Retention windows and the 24h cadence come from [`SyncConfig`]. Each
//! sweep is independent; a failing one is logged and the others still run.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use bridge_db::Database;
use chrono::{Duration, Utc};

use crate::config::SyncConfig;
use crate::error::SyncResult;

/// Background task that prunes aged log and queue rows.
pub struct Housekeeper {
    db: Database,
    config: Arc<SyncConfig>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling the housekeeper.
#[derive(Clone)]
pub struct HousekeeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl HousekeeperHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl Housekeeper {
    /// Creates a new housekeeper and returns a handle.
    pub fn new(db: Database, config: Arc<SyncConfig>) -> (Self, HousekeeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let housekeeper = Housekeeper {
            db,
            config,
            shutdown_rx,
        };

        (housekeeper, HousekeeperHandle { shutdown_tx })
    }

    /// Runs the housekeeping loop. Spawn as a background task. The first
    /// sweep happens immediately on startup, then every interval.
    pub async fn run(mut self) {
        info!(interval = ?self.config.housekeeping_interval, "Housekeeper starting");

        let mut interval = tokio::time::interval(self.config.housekeeping_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(?e, "Housekeeping cycle failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Housekeeper shutting down");
                    break;
                }
            }
        }
    }

    /// Runs the three sweeps once.
    pub async fn run_cycle(&self) -> SyncResult<()> {
        let now = Utc::now();

        match self
            .db
            .logs()
            .delete_webhooks_before(now - Duration::days(self.config.webhook_log_retention_days))
            .await
        {
            Ok(removed) if removed > 0 => info!(removed, "Pruned webhook logs"),
            Ok(_) => {}
            Err(e) => warn!(?e, "Webhook log sweep failed"),
        }

        match self
            .db
            .retry_queue()
            .delete_created_before(now - Duration::days(self.config.retry_retention_days))
            .await
        {
            Ok(removed) if removed > 0 => info!(removed, "Pruned retry queue rows"),
            Ok(_) => {}
            Err(e) => warn!(?e, "Retry queue sweep failed"),
        }

        match self
            .db
            .sync_queue()
            .delete_failed_before(now - Duration::days(self.config.failed_sync_retention_days))
            .await
        {
            Ok(removed) if removed > 0 => info!(removed, "Pruned failed sync rows"),
            Ok(_) => {}
            Err(e) => warn!(?e, "Failed sync sweep failed"),
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::SyncItemKind;
    use bridge_db::DbConfig;
    use chrono::NaiveDate;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn backdate(db: &Database, table: &str, days: i64) {
        let stamp = Utc::now() - Duration::days(days);
        sqlx::query(&format!("UPDATE {table} SET created_at = ?1"))
            .bind(stamp)
            .execute(db.pool())
            .await
            .unwrap();
    }

    async fn backdate_row(db: &Database, table: &str, id: &str, days: i64) {
        let stamp = Utc::now() - Duration::days(days);
        sqlx::query(&format!("UPDATE {table} SET created_at = ?1 WHERE id = ?2"))
            .bind(stamp)
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_retry_rows_pruned_by_age() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = Arc::new(SyncConfig::default());
        let (housekeeper, _handle) = Housekeeper::new(db.clone(), config);

        // 8 days old goes, 6 days old stays (7-day retention).
        let old = db
            .retry_queue()
            .enqueue("INVENTORY", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();
        backdate_row(&db, "retry_queue", &old.id, 8).await;
        let recent = db
            .retry_queue()
            .enqueue("RATES", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();
        backdate_row(&db, "retry_queue", &recent.id, 6).await;

        housekeeper.run_cycle().await.unwrap();

        let rows = db
            .retry_queue()
            .fetch_due(10, Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_type, "RATES");
    }

    #[tokio::test]
    async fn test_only_failed_sync_rows_are_pruned() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (housekeeper, _handle) = Housekeeper::new(db.clone(), Arc::new(SyncConfig::default()));

        let failed = db
            .sync_queue()
            .enqueue(SyncItemKind::Inventory, 1, d("2025-11-01"), d("2025-11-02"), &json!({}))
            .await
            .unwrap();
        db.sync_queue()
            .enqueue(SyncItemKind::Rates, 2, d("2025-11-01"), d("2025-11-02"), &json!({}))
            .await
            .unwrap();
        backdate(&db, "sync_queue", 8).await;
        db.sync_queue().mark_failed(&failed.id, "boom").await.unwrap();

        housekeeper.run_cycle().await.unwrap();

        // Old PENDING row survives; only the old FAILED one goes.
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 1);
        assert_eq!(db.sync_queue().fetch_pending(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_webhook_logs_survive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (housekeeper, _handle) = Housekeeper::new(db.clone(), Arc::new(SyncConfig::default()));

        db.logs()
            .record_webhook("/webhooks/channel-manager/reservation", &json!({}), 200)
            .await
            .unwrap();
        backdate(&db, "webhook_logs", 31).await;
        db.logs()
            .record_webhook("/webhooks/channel-manager/reservation", &json!({}), 200)
            .await
            .unwrap();

        housekeeper.run_cycle().await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
