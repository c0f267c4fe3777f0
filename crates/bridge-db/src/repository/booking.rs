//! # Booking Repository
//!
//! The last-known state of each channel manager reservation, keyed by its
//! natural `reservation_id`. Exactly one row exists per reservation: a
//! modify or cancel replaces the stored state in full, and the previous
//! state is what the reconciler consults to reverse inventory correctly.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bridge_core::BookingRecord;

/// Repository for booking state.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    /// Loads the current state of a reservation, if seen before.
    pub async fn find_by_reservation(
        &self,
        reservation_id: &str,
    ) -> DbResult<Option<BookingRecord>> {
        let record = sqlx::query_as::<_, BookingRecord>(
            r#"
            SELECT id, reservation_id, external_booking_id, channel,
                   checkin, checkout, guest, rooms, price_breakdown,
                   status, raw_payload, created_at, updated_at
            FROM bookings
            WHERE reservation_id = ?1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Inserts or fully replaces the stored state for a reservation.
    ///
    /// On conflict the original row id and created_at are kept; everything
    /// else is replaced with the new state.
    pub async fn upsert(&self, record: &BookingRecord) -> DbResult<()> {
        debug!(
            reservation_id = %record.reservation_id,
            status = %record.status,
            "Upserting booking state"
        );

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, reservation_id, external_booking_id, channel,
                checkin, checkout, guest, rooms, price_breakdown,
                status, raw_payload, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT (reservation_id) DO UPDATE SET
                external_booking_id = excluded.external_booking_id,
                channel = excluded.channel,
                checkin = excluded.checkin,
                checkout = excluded.checkout,
                guest = excluded.guest,
                rooms = excluded.rooms,
                price_breakdown = excluded.price_breakdown,
                status = excluded.status,
                raw_payload = excluded.raw_payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.reservation_id)
        .bind(&record.external_booking_id)
        .bind(&record.channel)
        .bind(record.checkin)
        .bind(record.checkout)
        .bind(&record.guest)
        .bind(&record.rooms)
        .bind(&record.price_breakdown)
        .bind(record.status)
        .bind(&record.raw_payload)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use bridge_core::{BookingAction, BookingRecord};
    use chrono::Utc;
    use uuid::Uuid;

    fn record(reservation_id: &str, checkin: &str, checkout: &str) -> BookingRecord {
        BookingRecord {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            external_booking_id: None,
            channel: "channel_manager".to_string(),
            checkin: checkin.parse().unwrap(),
            checkout: checkout.parse().unwrap(),
            guest: "{}".to_string(),
            rooms: r#"[{"roomCode":"STD","count":1}]"#.to_string(),
            price_breakdown: "{}".to_string(),
            status: BookingAction::Book,
            raw_payload: "{}".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let bookings = db.bookings();

        let first = record("RSV-1", "2025-10-01", "2025-10-03");
        bookings.upsert(&first).await.unwrap();

        let mut second = record("RSV-1", "2025-10-05", "2025-10-07");
        second.status = BookingAction::Modify;
        bookings.upsert(&second).await.unwrap();

        let stored = bookings.find_by_reservation("RSV-1").await.unwrap().unwrap();
        // Single row, original id, new state.
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.checkin, second.checkin);
        assert_eq!(stored.status, BookingAction::Modify);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unknown_reservation_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db
            .bookings()
            .find_by_reservation("RSV-MISSING")
            .await
            .unwrap()
            .is_none());
    }
}
