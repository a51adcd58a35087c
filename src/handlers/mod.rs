//! Read-only HTTP surface over a precomputed report bundle.

pub mod health;
pub mod reports;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use chrono::Utc;
use serde::Serialize;

use crate::services::reports::ReportBundle;

/// Shared application state: the immutable bundle computed at startup.
#[derive(Clone)]
pub struct AppState {
    pub bundle: Arc<ReportBundle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(bundle: ReportBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
            started_at: Instant::now(),
        }
    }
}

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::health_routes())
        .nest("/api", reports::report_routes())
        .with_state(state)
}
