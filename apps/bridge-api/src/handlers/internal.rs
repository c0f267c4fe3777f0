//! Internal sync endpoints.
//!
//! The PMS side of the house enqueues outbound changes here; the queue
//! processors deliver them to the channel manager on their own schedule.
//! Guarded by `x-api-key` — these routes are for trusted internal callers
//! only.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use bridge_core::SyncItemKind;

use crate::error::ApiError;
use crate::state::AppState;

/// Body accepted by all three sync endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Kind-specific fields, passed through to the payload builder at
    /// delivery time (availability, price, stopSell, ...).
    pub payload: Value,
}

/// `POST /sync/inventory`
pub async fn sync_inventory(
    state: State<AppState>,
    headers: HeaderMap,
    body: Json<SyncRequest>,
) -> Result<Json<Value>, ApiError> {
    enqueue(state, headers, body, SyncItemKind::Inventory).await
}

/// `POST /sync/rates`
pub async fn sync_rates(
    state: State<AppState>,
    headers: HeaderMap,
    body: Json<SyncRequest>,
) -> Result<Json<Value>, ApiError> {
    enqueue(state, headers, body, SyncItemKind::Rates).await
}

/// `POST /sync/restrictions`
pub async fn sync_restrictions(
    state: State<AppState>,
    headers: HeaderMap,
    body: Json<SyncRequest>,
) -> Result<Json<Value>, ApiError> {
    enqueue(state, headers, body, SyncItemKind::Restrictions).await
}

async fn enqueue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SyncRequest>,
    kind: SyncItemKind,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    if request.end_date < request.start_date {
        return Err(ApiError::BadRequest(
            "endDate must not precede startDate".to_string(),
        ));
    }

    let item = state
        .db
        .sync_queue()
        .enqueue(
            kind,
            request.room_id,
            request.start_date,
            request.end_date,
            &request.payload,
        )
        .await?;

    info!(id = %item.id, %kind, room_id = request.room_id, "Sync item queued");

    Ok(Json(json!({ "success": true, "id": item.id })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if key != state.config.internal_api_key {
        return Err(ApiError::Forbidden);
    }

    Ok(())
}
