use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;

use crate::handlers::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    /// When the served bundle was computed
    pub bundle_generated_at: String,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        bundle_generated_at: state.bundle.generated_at.to_rfc3339(),
    })
}
