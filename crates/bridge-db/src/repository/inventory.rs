//! # Inventory Ledger Repository
//!
//! The authoritative per-room, per-night available-count store. Rows are
//! never overwritten wholesale: every mutation is a signed delta, and the
//! row is created implicitly (upsert) on the first delta for a
//! (room, night). Counts may go negative, which means overbooked.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bridge_core::InventoryLevel;

/// Repository for the inventory ledger.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Applies a signed delta to one room-night, creating the row at the
    /// delta value if it does not exist yet.
    pub async fn apply_delta(&self, room_id: i64, date: NaiveDate, delta: i64) -> DbResult<()> {
        debug!(room_id, %date, delta, "Applying inventory delta");

        sqlx::query(
            r#"
            INSERT INTO inventory (room_id, date, available_count)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (room_id, date)
            DO UPDATE SET available_count = available_count + excluded.available_count
            "#,
        )
        .bind(room_id)
        .bind(date)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets the absolute level for one room-night (seeding, not ledger use).
    pub async fn set_level(&self, room_id: i64, date: NaiveDate, count: i64) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (room_id, date, available_count)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (room_id, date)
            DO UPDATE SET available_count = excluded.available_count
            "#,
        )
        .bind(room_id)
        .bind(date)
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads the level for one room-night, if a row exists.
    pub async fn get(&self, room_id: i64, date: NaiveDate) -> DbResult<Option<InventoryLevel>> {
        let level = sqlx::query_as::<_, InventoryLevel>(
            "SELECT room_id, date, available_count FROM inventory WHERE room_id = ?1 AND date = ?2",
        )
        .bind(room_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }
}
