//! # Sync Queue Repository
//!
//! Outbound PMS-side changes awaiting delivery to the channel manager.
//!
//! Rows are produced by the PMS integration (or the internal /sync
//! endpoints), drained FIFO by the sync queue processor, deleted on
//! successful delivery and marked FAILED otherwise. A row is moved to
//! PROCESSING before its payload is built so an overlapping cycle cannot
//! pick it up twice. FAILED rows are never re-promoted automatically.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use bridge_core::{SyncItemKind, SyncItemStatus, SyncQueueItem};

/// Repository for the outbound sync queue.
#[derive(Debug, Clone)]
pub struct SyncQueueRepository {
    pool: SqlitePool,
}

impl SyncQueueRepository {
    /// Creates a new SyncQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncQueueRepository { pool }
    }

    /// Enqueues a pending change.
    pub async fn enqueue(
        &self,
        kind: SyncItemKind,
        room_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        payload: &serde_json::Value,
    ) -> DbResult<SyncQueueItem> {
        let item = SyncQueueItem {
            id: Uuid::new_v4().to_string(),
            kind,
            room_id,
            start_date,
            end_date,
            payload: payload.to_string(),
            status: SyncItemStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at: Utc::now(),
        };

        debug!(id = %item.id, kind = %kind, room_id, "Enqueuing sync item");

        sqlx::query(
            r#"
            INSERT INTO sync_queue (
                id, kind, room_id, start_date, end_date,
                payload, status, retry_count, last_error, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(item.kind)
        .bind(item.room_id)
        .bind(item.start_date)
        .bind(item.end_date)
        .bind(&item.payload)
        .bind(item.status)
        .bind(item.retry_count)
        .bind(&item.last_error)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Fetches up to `limit` PENDING items, oldest first (FIFO fairness).
    pub async fn fetch_pending(&self, limit: u32) -> DbResult<Vec<SyncQueueItem>> {
        let items = sqlx::query_as::<_, SyncQueueItem>(
            r#"
            SELECT id, kind, room_id, start_date, end_date,
                   payload, status, retry_count, last_error, created_at
            FROM sync_queue
            WHERE status = 'PENDING'
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Transitions an item to PROCESSING.
    pub async fn mark_processing(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE sync_queue SET status = 'PROCESSING' WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records a failure: FAILED status, error text, retry_count + 1.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sync_queue SET
                status = 'FAILED',
                last_error = ?2,
                retry_count = retry_count + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a delivered item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes FAILED rows created before the cutoff. Returns rows removed.
    pub async fn delete_failed_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result =
            sqlx::query("DELETE FROM sync_queue WHERE status = 'FAILED' AND created_at < ?1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
