//! # Audit Log Repository
//!
//! Append-only trails: webhook_logs records every inbound payload,
//! channel_logs records outbound delivery outcomes (retry successes and the
//! like). Writes are best-effort from the callers' point of view — the
//! repository reports errors, callers log-and-swallow them so an audit
//! failure never blocks a booking or a delivery.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;

/// Repository for the audit trails.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Appends an inbound webhook payload.
    pub async fn record_webhook(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
        response_status: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_logs (id, endpoint, body, response_status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(endpoint)
        .bind(body.to_string())
        .bind(response_status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends an outbound delivery outcome.
    pub async fn record_channel(
        &self,
        property_id: Option<&str>,
        channel: &str,
        message: &str,
        payload: &serde_json::Value,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO channel_logs (id, property_id, channel, message, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(property_id)
        .bind(channel)
        .bind(message)
        .bind(payload.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes webhook logs created before the cutoff. Returns rows removed.
    pub async fn delete_webhooks_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM webhook_logs WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
