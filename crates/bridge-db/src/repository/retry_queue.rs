//! # Retry Queue Repository
//!
//! Deferred re-delivery for any failed outbound HTTP push. A row stores the
//! exact request to repeat (endpoint, body, headers); `next_try_at` gates
//! when the retry processor may attempt it again. Rows are deleted on
//! success, and on failure have try_count incremented and next_try_at
//! pushed out — never removed by the processor itself.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use bridge_core::RetryQueueItem;

/// Repository for the retry queue.
#[derive(Debug, Clone)]
pub struct RetryQueueRepository {
    pool: SqlitePool,
}

impl RetryQueueRepository {
    /// Creates a new RetryQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RetryQueueRepository { pool }
    }

    /// Enqueues a failed push for re-delivery, due immediately.
    pub async fn enqueue(
        &self,
        request_type: &str,
        endpoint: &str,
        payload: &serde_json::Value,
        headers: &serde_json::Value,
    ) -> DbResult<RetryQueueItem> {
        let now = Utc::now();
        let item = RetryQueueItem {
            id: Uuid::new_v4().to_string(),
            request_type: request_type.to_string(),
            endpoint: endpoint.to_string(),
            payload: payload.to_string(),
            headers: headers.to_string(),
            try_count: 0,
            next_try_at: now,
            created_at: now,
        };

        debug!(id = %item.id, request_type, endpoint, "Enqueuing retry item");

        sqlx::query(
            r#"
            INSERT INTO retry_queue (
                id, request_type, endpoint, payload, headers,
                try_count, next_try_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.request_type)
        .bind(&item.endpoint)
        .bind(&item.payload)
        .bind(&item.headers)
        .bind(item.try_count)
        .bind(item.next_try_at)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Fetches up to `limit` items whose next_try_at has elapsed, earliest
    /// due first.
    pub async fn fetch_due(&self, limit: u32, now: DateTime<Utc>) -> DbResult<Vec<RetryQueueItem>> {
        let items = sqlx::query_as::<_, RetryQueueItem>(
            r#"
            SELECT id, request_type, endpoint, payload, headers,
                   try_count, next_try_at, created_at
            FROM retry_queue
            WHERE next_try_at <= ?1
            ORDER BY next_try_at ASC
            LIMIT ?2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Records another failed attempt: try_count + 1, new due time.
    pub async fn record_failure(&self, id: &str, next_try_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE retry_queue SET
                try_count = try_count + 1,
                next_try_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(next_try_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a successfully re-delivered item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM retry_queue WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes rows created before the cutoff regardless of outcome.
    /// Returns rows removed.
    pub async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM retry_queue WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_due_selection_and_ordering() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.retry_queue();
        let now = Utc::now();

        let a = queue
            .enqueue("INVENTORY", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();
        let b = queue
            .enqueue("RATES", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();

        // Push b's due time into the future; only a should be selected.
        queue
            .record_failure(&b.id, now + Duration::seconds(3600))
            .await
            .unwrap();

        let due = queue.fetch_due(10, now + Duration::seconds(1)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, a.id);

        // Once past the new due time, b reappears after a.
        let due = queue
            .fetch_due(10, now + Duration::seconds(7200))
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].id, a.id);
        assert_eq!(due[1].id, b.id);
    }

    #[tokio::test]
    async fn test_record_failure_increments_try_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.retry_queue();

        let item = queue
            .enqueue("INVENTORY", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();
        queue
            .record_failure(&item.id, Utc::now() + chrono::Duration::seconds(2))
            .await
            .unwrap();
        queue
            .record_failure(&item.id, Utc::now() + chrono::Duration::seconds(4))
            .await
            .unwrap();

        let stored = queue
            .fetch_due(10, Utc::now() + chrono::Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(stored[0].try_count, 2);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.retry_queue();

        let item = queue
            .enqueue("RATES", "https://cm.example/u", &json!({}), &json!({}))
            .await
            .unwrap();
        queue.delete(&item.id).await.unwrap();

        assert!(queue.fetch_due(10, Utc::now()).await.unwrap().is_empty());
    }
}
