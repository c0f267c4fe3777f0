//! # Domain Types
//!
//! The records this service persists and the inbound booking event shape.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Inbound                         Persisted                          │
//! │  ┌───────────────┐               ┌───────────────┐                  │
//! │  │ BookingEvent  │──reconciled──►│ BookingRecord │ (1 per           │
//! │  │ action        │               │ InventoryLevel│  reservation_id) │
//! │  │ rooms[]       │               └───────────────┘                  │
//! │  └───────────────┘                                                  │
//! │                                                                     │
//! │  Outbound                                                           │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │ SyncQueueItem │   │RetryQueueItem │   │ChannelSettings│          │
//! │  │ PENDING/..    │   │ next_try_at   │   │ api_user/pass │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! JSON-bearing columns (guest, rooms, payloads, headers) are kept as raw
//! `String` on the record types so they round-trip through SQLite untouched;
//! typed accessors parse on demand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Booking Action
// =============================================================================

/// The lifecycle action carried by a booking notification.
///
/// Expected monotonic order per reservation: book → modify* → cancel.
/// Duplicate deliveries are not deduplicated here; see BookingReconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    /// New reservation: deduct inventory for every night of the stay.
    Book,
    /// Changed reservation: restore the previous stay, deduct the new one.
    Modify,
    /// Cancelled reservation: restore inventory for every night.
    Cancel,
}

impl Default for BookingAction {
    fn default() -> Self {
        BookingAction::Book
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingAction::Book => "book",
            BookingAction::Modify => "modify",
            BookingAction::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Booking Event (inbound webhook body)
// =============================================================================

/// One room line of a booking: the channel manager's room code and how many
/// units of that room the reservation occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStay {
    pub room_code: String,

    /// Units booked of this room type. Channel managers usually send one
    /// room object per physical room, so the field defaults to 1.
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_count() -> i64 {
    1
}

/// An inbound booking notification from the channel manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    /// Natural key of the reservation. Some channel managers send
    /// `bookingId`, others `reservationId`.
    #[serde(alias = "bookingId")]
    pub reservation_id: String,

    /// The channel manager's own booking identifier, if distinct.
    #[serde(default, alias = "cmBookingId")]
    pub external_booking_id: Option<String>,

    /// Missing action means a fresh booking.
    #[serde(default)]
    pub action: BookingAction,

    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,

    #[serde(default)]
    pub guest: serde_json::Value,

    #[serde(default)]
    pub rooms: Vec<RoomStay>,

    #[serde(default)]
    pub price_breakdown: serde_json::Value,
}

// =============================================================================
// Persisted Records
// =============================================================================

/// Static translation between a local PMS room id and the channel manager's
/// room code. Unique on both sides; read-only to this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RoomMapping {
    pub id: String,
    pub room_id: i64,
    pub room_code: String,
}

/// Available count for one room on one night. Negative means overbooked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLevel {
    pub room_id: i64,
    pub date: NaiveDate,
    pub available_count: i64,
}

/// Last-known state of a reservation, keyed by `reservation_id`.
///
/// This row is the system's only memory of a booking's prior state: a
/// modify or cancel consults it to compute the correct inventory reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookingRecord {
    pub id: String,
    pub reservation_id: String,
    pub external_booking_id: Option<String>,
    pub channel: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    /// Guest details as received, stored verbatim (JSON).
    pub guest: String,
    /// The stay's room lines (JSON array of [`RoomStay`]).
    pub rooms: String,
    /// Price breakdown as received, stored verbatim (JSON).
    pub price_breakdown: String,
    pub status: BookingAction,
    /// Full original webhook body, for audit and replays.
    pub raw_payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Parses the stored `rooms` JSON back into room lines.
    pub fn room_stays(&self) -> CoreResult<Vec<RoomStay>> {
        serde_json::from_str(&self.rooms)
            .map_err(|e| CoreError::invalid_payload("rooms", e.to_string()))
    }
}

// =============================================================================
// Sync Queue
// =============================================================================

/// What kind of channel manager update a sync queue item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncItemKind {
    Inventory,
    Rates,
    Restrictions,
}

impl fmt::Display for SyncItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncItemKind::Inventory => "INVENTORY",
            SyncItemKind::Rates => "RATES",
            SyncItemKind::Restrictions => "RESTRICTIONS",
        };
        f.write_str(s)
    }
}

/// Processing state of a sync queue item.
///
/// PROCESSING is set before payload building so a second overlapping cycle
/// cannot pick the same row up again. There is no automatic FAILED → PENDING
/// promotion; failed rows wait for external re-queueing or the housekeeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncItemStatus {
    Pending,
    Processing,
    Failed,
}

/// A pending outbound change (inventory, rate or restriction update).
///
/// Produced by the PMS integration, consumed and deleted by the sync queue
/// processor on success, or marked FAILED on error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncQueueItem {
    pub id: String,
    pub kind: SyncItemKind,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Type-specific partial update (JSON), e.g. `{"availability": 3}`.
    pub payload: String,
    pub status: SyncItemStatus,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncQueueItem {
    /// Parses the opaque payload column.
    pub fn payload_json(&self) -> CoreResult<serde_json::Value> {
        serde_json::from_str(&self.payload)
            .map_err(|e| CoreError::invalid_payload("payload", e.to_string()))
    }
}

// =============================================================================
// Retry Queue
// =============================================================================

/// A failed outbound push awaiting re-delivery.
///
/// Deleted on successful retry; on repeated failure `try_count` grows and
/// `next_try_at` is pushed out with capped exponential backoff. Never
/// removed by the retry processor itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RetryQueueItem {
    pub id: String,
    /// The update kind that originally failed ("INVENTORY", "RATES", ...).
    pub request_type: String,
    pub endpoint: String,
    /// The exact JSON body to re-send.
    pub payload: String,
    /// HTTP headers to re-send (JSON object of string → string).
    pub headers: String,
    pub try_count: i64,
    pub next_try_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RetryQueueItem {
    /// Parses the stored headers column into name/value pairs.
    pub fn header_pairs(&self) -> CoreResult<Vec<(String, String)>> {
        let map: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&self.headers)
                .map_err(|e| CoreError::invalid_payload("headers", e.to_string()))?;
        Ok(map.into_iter().collect())
    }
}

// =============================================================================
// Channel Settings
// =============================================================================

/// Credentials and property identity for the channel manager account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChannelSettings {
    pub id: String,
    pub channel: String,
    pub api_user: String,
    pub api_pass: String,
    pub property_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
