//! Route handlers.

pub mod internal;
pub mod webhook;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /` — liveness plus a database ping.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = if state.db.health_check().await {
        "ok"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "service": "bridge-api"
    }))
}
