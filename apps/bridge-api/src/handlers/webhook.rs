//! Inbound booking webhook.
//!
//! The channel manager POSTs booking lifecycle events here. Authentication
//! is a shared secret in the `x-webhook-token` header. The raw body is kept
//! alongside the parsed event so the audit trail stores exactly what was
//! received.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use bridge_core::BookingEvent;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /webhooks/channel-manager/reservation`
pub async fn reservation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;

    let event: BookingEvent = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::BadRequest(format!("Malformed booking event: {e}")))?;

    info!(reservation_id = %event.reservation_id, action = %event.action, "Booking webhook received");

    state.reconciler.handle(&event, &body).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking processed and inventory updated"
    })))
}

/// Verified only when a secret is configured; deployments without one
/// accept every delivery.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(secret) = state.config.webhook_secret.as_deref() else {
        return Ok(());
    };

    let token = headers
        .get("x-webhook-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if token != secret {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}
