//! Router assembly.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Builds the full route table over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route(
            "/webhooks/channel-manager/reservation",
            post(handlers::webhook::reservation),
        )
        .route("/sync/inventory", post(handlers::internal::sync_inventory))
        .route("/sync/rates", post(handlers::internal::sync_rates))
        .route(
            "/sync/restrictions",
            post(handlers::internal::sync_restrictions),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bridge_db::{Database, DbConfig};
    use bridge_sync::BookingReconciler;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.mappings().insert(5, "DLX").await.unwrap();
        let reconciler = BookingReconciler::new(db.clone(), "channel_manager");
        let config = ApiConfig {
            port: 0,
            database_path: ":memory:".to_string(),
            webhook_secret: Some("hook-secret".to_string()),
            internal_api_key: "internal-key".to_string(),
        };
        AppState::new(db, reconciler, config)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, headers: &[(&str, &str)], body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_database() {
        let app = router(test_state().await);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_token() {
        let app = router(test_state().await);
        let request = post_json(
            "/webhooks/channel-manager/reservation",
            &[("x-webhook-token", "wrong")],
            json!({"reservationId": "R1"}),
        );

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_webhook_open_when_no_secret_configured() {
        let mut state = test_state().await;
        let mut config = (*state.config).clone();
        config.webhook_secret = None;
        state.config = std::sync::Arc::new(config);
        let app = router(state);

        // No token header at all; the event must still be processed.
        let request = post_json(
            "/webhooks/channel-manager/reservation",
            &[],
            json!({
                "reservationId": "R-200",
                "action": "book",
                "checkInDate": "2025-12-01",
                "checkOutDate": "2025-12-02",
                "rooms": [{"roomCode": "DLX"}]
            }),
        );

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_webhook_processes_booking() {
        let state = test_state().await;
        state
            .db
            .inventory()
            .set_level(5, "2025-12-01".parse().unwrap(), 6)
            .await
            .unwrap();
        let app = router(state.clone());

        let request = post_json(
            "/webhooks/channel-manager/reservation",
            &[("x-webhook-token", "hook-secret")],
            json!({
                "reservationId": "R-100",
                "action": "book",
                "checkInDate": "2025-12-01",
                "checkOutDate": "2025-12-02",
                "rooms": [{"roomCode": "DLX", "count": 2}]
            }),
        );

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Booking processed and inventory updated");

        let level = state
            .db
            .inventory()
            .get(5, "2025-12-01".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(level.available_count, 4);
    }

    #[tokio::test]
    async fn test_webhook_rejects_malformed_event() {
        let app = router(test_state().await);
        let request = post_json(
            "/webhooks/channel-manager/reservation",
            &[("x-webhook-token", "hook-secret")],
            json!({"checkInDate": "not-a-date"}),
        );

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_sync_endpoint_requires_api_key() {
        let app = router(test_state().await);
        let request = post_json(
            "/sync/inventory",
            &[],
            json!({
                "roomId": 5,
                "startDate": "2025-12-01",
                "endDate": "2025-12-05",
                "payload": {"availability": 3}
            }),
        );

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sync_endpoint_enqueues_item() {
        let state = test_state().await;
        let app = router(state.clone());

        let request = post_json(
            "/sync/rates",
            &[("x-api-key", "internal-key")],
            json!({
                "roomId": 5,
                "startDate": "2025-12-01",
                "endDate": "2025-12-05",
                "payload": {"price": 145.0}
            }),
        );

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let pending = state.db.sync_queue().fetch_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, bridge_core::SyncItemKind::Rates);
        assert_eq!(pending[0].id, body["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_sync_endpoint_rejects_inverted_range() {
        let app = router(test_state().await);
        let request = post_json(
            "/sync/inventory",
            &[("x-api-key", "internal-key")],
            json!({
                "roomId": 5,
                "startDate": "2025-12-05",
                "endDate": "2025-12-01",
                "payload": {"availability": 1}
            }),
        );

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
