//! # Booking Reconciler
//!
//! Applies an inbound booking event's net inventory effect to the local
//! ledger and records the reservation's new state.
//!
//! ## Delta State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  book    deduct count for every (mapped room, night in range)       │
//! │  cancel  add count back for every (mapped room, night in range)     │
//! │  modify  restore the PREVIOUS stored stay (its rooms, its dates),   │
//! │          then deduct the new one; no previous row → plain book      │
//! │                                                                     │
//! │  nights of a stay = [checkin, checkout)                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unmapped room codes are logged and skipped — a booking must not fail
//! because one room lacks a mapping. The stored bookings row is the only
//! memory of prior state; it is replaced in full after deltas are applied.
//!
//! Re-delivery of an identical book event double-deducts: the upstream
//! protocol sends each lifecycle transition once (book → modify* → cancel)
//! and carries no per-delivery idempotency token to deduplicate on.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bridge_core::{nights, BookingAction, BookingEvent, BookingRecord, RoomStay};
use bridge_db::Database;

use crate::error::SyncResult;

/// Audit endpoint tag written to webhook_logs for booking events.
const BOOKING_AUDIT_ENDPOINT: &str = "/webhooks/channel-manager/reservation";

/// Consumes inbound booking events and keeps the inventory ledger and the
/// booking table consistent with them.
#[derive(Debug, Clone)]
pub struct BookingReconciler {
    db: Database,
    /// Channel tag stored on booking rows.
    channel: String,
}

impl BookingReconciler {
    /// Creates a new reconciler.
    pub fn new(db: Database, channel: impl Into<String>) -> Self {
        BookingReconciler {
            db,
            channel: channel.into(),
        }
    }

    /// Processes one booking event: audit row, inventory deltas, state
    /// upsert. `raw_payload` is the webhook body as received, persisted
    /// verbatim for audit and replays.
    pub async fn handle(&self, event: &BookingEvent, raw_payload: &Value) -> SyncResult<()> {
        info!(
            reservation_id = %event.reservation_id,
            action = %event.action,
            checkin = %event.check_in_date,
            checkout = %event.check_out_date,
            rooms = event.rooms.len(),
            "Processing booking event"
        );

        // Fire-and-forget audit; never blocks or fails the booking.
        if let Err(e) = self
            .db
            .logs()
            .record_webhook(BOOKING_AUDIT_ENDPOINT, raw_payload, 200)
            .await
        {
            warn!(?e, "Failed to write webhook audit row");
        }

        match event.action {
            BookingAction::Book => {
                self.apply_stay(&event.rooms, event.check_in_date, event.check_out_date, -1)
                    .await?;
            }

            BookingAction::Cancel => {
                self.apply_stay(&event.rooms, event.check_in_date, event.check_out_date, 1)
                    .await?;
            }

            BookingAction::Modify => {
                self.reverse_previous_stay(event).await?;
                self.apply_stay(&event.rooms, event.check_in_date, event.check_out_date, -1)
                    .await?;
            }
        }

        self.db.bookings().upsert(&self.record_from(event, raw_payload)).await?;

        Ok(())
    }

    /// Restores inventory for the stay currently stored under the event's
    /// reservation_id. Absent row means the modify arrived before (or
    /// without) its book — treated as a plain book, nothing to restore.
    async fn reverse_previous_stay(&self, event: &BookingEvent) -> SyncResult<()> {
        let Some(previous) = self
            .db
            .bookings()
            .find_by_reservation(&event.reservation_id)
            .await?
        else {
            warn!(
                reservation_id = %event.reservation_id,
                "Modify for unknown reservation, treating as book"
            );
            return Ok(());
        };

        // The stored rooms are what was actually deducted. If that column
        // is unreadable, the event's rooms are the best approximation left.
        let rooms = match previous.room_stays() {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(
                    reservation_id = %event.reservation_id,
                    ?e,
                    "Stored rooms unreadable, reversing with the event's rooms"
                );
                event.rooms.clone()
            }
        };

        self.apply_stay(&rooms, previous.checkin, previous.checkout, 1)
            .await
    }

    /// Applies `sign * count` to every (mapped room, night) of a stay.
    async fn apply_stay(
        &self,
        rooms: &[RoomStay],
        checkin: NaiveDate,
        checkout: NaiveDate,
        sign: i64,
    ) -> SyncResult<()> {
        for stay in rooms {
            let Some(room_id) = self.db.mappings().to_local(&stay.room_code).await? else {
                warn!(room_code = %stay.room_code, "No room mapping, skipping room");
                continue;
            };

            for night in nights(checkin, checkout) {
                self.db
                    .inventory()
                    .apply_delta(room_id, night, sign * stay.count)
                    .await?;
            }

            debug!(
                room_code = %stay.room_code,
                room_id,
                delta = sign * stay.count,
                "Applied stay deltas"
            );
        }

        Ok(())
    }

    fn record_from(&self, event: &BookingEvent, raw_payload: &Value) -> BookingRecord {
        let now = Utc::now();
        BookingRecord {
            id: Uuid::new_v4().to_string(),
            reservation_id: event.reservation_id.clone(),
            external_booking_id: event.external_booking_id.clone(),
            channel: self.channel.clone(),
            checkin: event.check_in_date,
            checkout: event.check_out_date,
            guest: event.guest.to_string(),
            rooms: serde_json::to_string(&event.rooms).unwrap_or_else(|_| "[]".to_string()),
            price_breakdown: event.price_breakdown.to_string(),
            status: event.action,
            raw_payload: raw_payload.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_db::{Database, DbConfig};
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn setup() -> (Database, BookingReconciler) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.mappings().insert(5, "DLX").await.unwrap();
        db.mappings().insert(6, "STD").await.unwrap();
        let reconciler = BookingReconciler::new(db.clone(), "channel_manager");
        (db, reconciler)
    }

    fn event(raw: Value) -> (BookingEvent, Value) {
        (serde_json::from_value(raw.clone()).unwrap(), raw)
    }

    async fn available(db: &Database, room_id: i64, date: &str) -> Option<i64> {
        db.inventory()
            .get(room_id, d(date))
            .await
            .unwrap()
            .map(|l| l.available_count)
    }

    #[tokio::test]
    async fn test_book_deducts_each_night_not_checkout() {
        let (db, reconciler) = setup().await;
        db.inventory().set_level(5, d("2025-10-01"), 10).await.unwrap();
        db.inventory().set_level(5, d("2025-10-02"), 10).await.unwrap();
        db.inventory().set_level(5, d("2025-10-03"), 10).await.unwrap();

        let (event, raw) = event(json!({
            "reservationId": "RSV-1",
            "action": "book",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "DLX", "count": 2}]
        }));
        reconciler.handle(&event, &raw).await.unwrap();

        assert_eq!(available(&db, 5, "2025-10-01").await, Some(8));
        assert_eq!(available(&db, 5, "2025-10-02").await, Some(8));
        // Checkout date itself untouched.
        assert_eq!(available(&db, 5, "2025-10-03").await, Some(10));
    }

    #[tokio::test]
    async fn test_book_then_cancel_nets_to_zero() {
        let (db, reconciler) = setup().await;
        db.inventory().set_level(5, d("2025-10-01"), 7).await.unwrap();
        db.inventory().set_level(5, d("2025-10-02"), 7).await.unwrap();

        let (book, book_raw) = event(json!({
            "reservationId": "RSV-2",
            "action": "book",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&book, &book_raw).await.unwrap();
        assert_eq!(available(&db, 5, "2025-10-01").await, Some(6));

        let (cancel, cancel_raw) = event(json!({
            "reservationId": "RSV-2",
            "action": "cancel",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&cancel, &cancel_raw).await.unwrap();

        assert_eq!(available(&db, 5, "2025-10-01").await, Some(7));
        assert_eq!(available(&db, 5, "2025-10-02").await, Some(7));

        let stored = db.bookings().find_by_reservation("RSV-2").await.unwrap().unwrap();
        assert_eq!(stored.status, BookingAction::Cancel);
    }

    #[tokio::test]
    async fn test_modify_moves_date_range_exactly() {
        let (db, reconciler) = setup().await;
        for date in ["2025-10-01", "2025-10-02", "2025-10-05", "2025-10-06"] {
            db.inventory().set_level(5, d(date), 4).await.unwrap();
        }

        let (book, book_raw) = event(json!({
            "reservationId": "RSV-3",
            "action": "book",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&book, &book_raw).await.unwrap();

        let (modify, modify_raw) = event(json!({
            "reservationId": "RSV-3",
            "action": "modify",
            "checkInDate": "2025-10-05",
            "checkOutDate": "2025-10-07",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&modify, &modify_raw).await.unwrap();

        // Old range fully restored, new range deducted.
        assert_eq!(available(&db, 5, "2025-10-01").await, Some(4));
        assert_eq!(available(&db, 5, "2025-10-02").await, Some(4));
        assert_eq!(available(&db, 5, "2025-10-05").await, Some(3));
        assert_eq!(available(&db, 5, "2025-10-06").await, Some(3));

        let stored = db.bookings().find_by_reservation("RSV-3").await.unwrap().unwrap();
        assert_eq!(stored.checkin, d("2025-10-05"));
        assert_eq!(stored.status, BookingAction::Modify);
    }

    #[tokio::test]
    async fn test_modify_reverses_previously_stored_rooms() {
        let (db, reconciler) = setup().await;
        for date in ["2025-10-01", "2025-10-02"] {
            db.inventory().set_level(5, d(date), 4).await.unwrap();
            db.inventory().set_level(6, d(date), 4).await.unwrap();
        }

        let (book, book_raw) = event(json!({
            "reservationId": "RSV-4",
            "action": "book",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&book, &book_raw).await.unwrap();

        // The modify switches room type; the DLX deduction must come back.
        let (modify, modify_raw) = event(json!({
            "reservationId": "RSV-4",
            "action": "modify",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-03",
            "rooms": [{"roomCode": "STD", "count": 1}]
        }));
        reconciler.handle(&modify, &modify_raw).await.unwrap();

        assert_eq!(available(&db, 5, "2025-10-01").await, Some(4));
        assert_eq!(available(&db, 6, "2025-10-01").await, Some(3));
    }

    #[tokio::test]
    async fn test_unmapped_room_is_skipped_silently() {
        let (db, reconciler) = setup().await;
        db.inventory().set_level(5, d("2025-10-01"), 9).await.unwrap();

        let (event, raw) = event(json!({
            "reservationId": "RSV-5",
            "action": "book",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-02",
            "rooms": [
                {"roomCode": "UNMAPPED", "count": 1},
                {"roomCode": "DLX", "count": 1}
            ]
        }));
        reconciler.handle(&event, &raw).await.unwrap();

        // Mapped room deducted, unmapped one changed nothing anywhere.
        assert_eq!(available(&db, 5, "2025-10-01").await, Some(8));
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_modify_without_previous_booking_acts_as_book() {
        let (db, reconciler) = setup().await;
        db.inventory().set_level(5, d("2025-10-01"), 5).await.unwrap();

        let (event, raw) = event(json!({
            "reservationId": "RSV-6",
            "action": "modify",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-02",
            "rooms": [{"roomCode": "DLX", "count": 1}]
        }));
        reconciler.handle(&event, &raw).await.unwrap();

        assert_eq!(available(&db, 5, "2025-10-01").await, Some(4));
        assert!(db.bookings().find_by_reservation("RSV-6").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_event_writes_audit_row() {
        let (db, reconciler) = setup().await;

        let (event, raw) = event(json!({
            "reservationId": "RSV-7",
            "checkInDate": "2025-10-01",
            "checkOutDate": "2025-10-02",
            "rooms": []
        }));
        reconciler.handle(&event, &raw).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
