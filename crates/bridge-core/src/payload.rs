//! # Outbound Payload Builders
//!
//! Converts a queued PMS-side change into the channel manager's update
//! envelope:
//!
//! ```json
//! {
//!   "updates": [{
//!     "startDate": "2025-11-01",
//!     "endDate": "2025-11-02",
//!     "rooms": [{ "roomCode": "DLX", "available": 3 }]
//!   }]
//! }
//! ```
//!
//! Builders are pure: the room code is resolved by the caller (it needs the
//! mapping table) and passed in. Numeric fields are coerced explicitly —
//! JSON numbers and numeric strings are accepted, anything else fails with
//! `InvalidPayload` instead of silently producing NaN. Boolean-ish fields
//! accept `true`/`false` and their string forms. Unset optional fields are
//! omitted from the JSON rather than sent as null.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::types::SyncItemKind;

// =============================================================================
// Envelope Types
// =============================================================================

/// The channel manager's update request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    pub updates: Vec<RangeUpdate>,
}

/// One update spanning a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeUpdate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rooms: Vec<RoomUpdate>,
}

/// One room line inside an update. Exactly the fields relevant to the update
/// kind are set; the rest are omitted from the serialized JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    pub room_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sell: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stay: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stay: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_on_arrival: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_on_departure: Option<bool>,
}

impl RoomUpdate {
    fn new(room_code: &str) -> Self {
        RoomUpdate {
            room_code: room_code.to_string(),
            available: None,
            price: None,
            stop_sell: None,
            min_stay: None,
            max_stay: None,
            close_on_arrival: None,
            close_on_departure: None,
        }
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Builds the update envelope for a queued change of the given kind.
pub fn build_update(
    kind: SyncItemKind,
    room_code: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    payload: &Value,
) -> CoreResult<UpdateEnvelope> {
    let room = match kind {
        SyncItemKind::Inventory => inventory_room(room_code, payload)?,
        SyncItemKind::Rates => rates_room(room_code, payload)?,
        SyncItemKind::Restrictions => restrictions_room(room_code, payload)?,
    };

    Ok(UpdateEnvelope {
        updates: vec![RangeUpdate {
            start_date,
            end_date,
            rooms: vec![room],
        }],
    })
}

fn inventory_room(room_code: &str, payload: &Value) -> CoreResult<RoomUpdate> {
    let mut room = RoomUpdate::new(room_code);
    room.available = Some(int_field(payload, "availability")?);
    Ok(room)
}

fn rates_room(room_code: &str, payload: &Value) -> CoreResult<RoomUpdate> {
    let mut room = RoomUpdate::new(room_code);
    room.price = Some(float_field(payload, "price")?);
    Ok(room)
}

fn restrictions_room(room_code: &str, payload: &Value) -> CoreResult<RoomUpdate> {
    let mut room = RoomUpdate::new(room_code);
    room.stop_sell = Some(bool_field(payload, "stopSell")?);
    room.min_stay = opt_int_field(payload, "minStay")?;
    room.max_stay = opt_int_field(payload, "maxStay")?;
    room.close_on_arrival = Some(bool_field(payload, "closeOnArrival")?);
    room.close_on_departure = Some(bool_field(payload, "closeOnDeparture")?);
    Ok(room)
}

// =============================================================================
// Field Coercion
// =============================================================================

/// Required integer: accepts a JSON integer or a numeric string.
fn int_field(payload: &Value, field: &str) -> CoreResult<i64> {
    opt_int_field(payload, field)?
        .ok_or_else(|| CoreError::invalid_payload(field, "required integer is missing"))
}

/// Optional integer: absent or null means unset.
fn opt_int_field(payload: &Value, field: &str) -> CoreResult<Option<i64>> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| CoreError::invalid_payload(field, format!("expected an integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| CoreError::invalid_payload(field, format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(CoreError::invalid_payload(
            field,
            format!("expected an integer, got {other}"),
        )),
    }
}

/// Required float: accepts any JSON number or a numeric string.
fn float_field(payload: &Value, field: &str) -> CoreResult<f64> {
    match payload.get(field) {
        None | Some(Value::Null) => {
            Err(CoreError::invalid_payload(field, "required number is missing"))
        }
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CoreError::invalid_payload(field, format!("expected a number, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::invalid_payload(field, format!("expected a number, got \"{s}\""))),
        Some(other) => Err(CoreError::invalid_payload(
            field,
            format!("expected a number, got {other}"),
        )),
    }
}

/// Boolean-ish: `true`/`false` or their string forms; absent means false.
fn bool_field(payload: &Value, field: &str) -> CoreResult<bool> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(CoreError::invalid_payload(
                field,
                format!("expected a boolean, got \"{other}\""),
            )),
        },
        Some(other) => Err(CoreError::invalid_payload(
            field,
            format!("expected a boolean, got {other}"),
        )),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
