//! Shared handler state.

use std::sync::Arc;

use bridge_db::Database;
use bridge_sync::BookingReconciler;

use crate::config::ApiConfig;

/// State shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reconciler: BookingReconciler,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, reconciler: BookingReconciler, config: ApiConfig) -> Self {
        AppState {
            db,
            reconciler,
            config: Arc::new(config),
        }
    }
}
