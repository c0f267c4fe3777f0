//! # Room Mapping Repository
//!
//! Bidirectional lookup between local PMS room ids and the channel
//! manager's room codes. Static reference data, unique on both sides.
//!
//! Lookups return `Option`: callers decide whether a missing mapping is
//! fatal (outbound payload building) or skippable (inbound reconciliation).

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use bridge_core::RoomMapping;

/// Repository for room mapping lookups.
#[derive(Debug, Clone)]
pub struct RoomMappingRepository {
    pool: SqlitePool,
}

impl RoomMappingRepository {
    /// Creates a new RoomMappingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomMappingRepository { pool }
    }

    /// Resolves a channel manager room code to the local room id.
    pub async fn to_local(&self, room_code: &str) -> DbResult<Option<i64>> {
        let room_id = sqlx::query_scalar::<_, i64>(
            "SELECT room_id FROM room_mapping WHERE room_code = ?1",
        )
        .bind(room_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_id)
    }

    /// Resolves a local room id to the channel manager's room code.
    pub async fn to_external(&self, room_id: i64) -> DbResult<Option<String>> {
        let room_code = sqlx::query_scalar::<_, String>(
            "SELECT room_code FROM room_mapping WHERE room_id = ?1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_code)
    }

    /// Inserts a mapping row (reference-data seeding).
    pub async fn insert(&self, room_id: i64, room_code: &str) -> DbResult<RoomMapping> {
        let mapping = RoomMapping {
            id: Uuid::new_v4().to_string(),
            room_id,
            room_code: room_code.to_string(),
        };

        sqlx::query("INSERT INTO room_mapping (id, room_id, room_code) VALUES (?1, ?2, ?3)")
            .bind(&mapping.id)
            .bind(mapping.room_id)
            .bind(&mapping.room_code)
            .execute(&self.pool)
            .await?;

        Ok(mapping)
    }
}
