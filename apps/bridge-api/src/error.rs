//! HTTP error mapping.
//!
//! Handlers return [`ApiError`]; the IntoResponse impl fixes the wire shape:
//! `{"success": false, "error": "..."}` with an appropriate status. The one
//! exception is the internal API key check, which answers with a bare 403.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or wrong webhook token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Missing or wrong internal API key. Answered with a bare 403 so the
    /// protected endpoints reveal nothing about themselves.
    #[error("Forbidden")]
    Forbidden,

    /// The request body could not be used.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Anything that failed past validation.
    #[error(transparent)]
    Internal(#[from] bridge_sync::SyncError),
}

impl From<bridge_db::DbError> for ApiError {
    fn from(e: bridge_db::DbError) -> Self {
        ApiError::Internal(bridge_sync::SyncError::Db(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized".to_string()),
            ApiError::Forbidden => return StatusCode::FORBIDDEN.into_response(),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Internal(e) => {
                error!(?e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
