use axum::{extract::State, response::Json, routing::get, Router};

use crate::errors::RecordIssue;
use crate::handlers::{ApiResponse, AppState};
use crate::quality::QualityIssue;
use crate::services::inventory::InventoryStatusRow;
use crate::services::kpi::KpiSummary;
use crate::services::reports::{
    MonthlyTrendRow, ProductPerformanceRow, RegionalPerformanceRow, RepPerformanceRow,
    SeasonalityReport,
};
use crate::services::rfm::RfmReport;

/// Routes scoped under `/api`.
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/kpis", get(get_kpis))
        .route("/quality", get(get_quality))
        .route("/reports/revenue-trends", get(get_revenue_trends))
        .route("/reports/regional", get(get_regional_performance))
        .route("/reports/reps", get(get_rep_performance))
        .route("/reports/products", get(get_product_performance))
        .route("/reports/seasonality", get(get_seasonality))
        .route("/reports/customer-segments", get(get_customer_segments))
        .route("/reports/inventory", get(get_inventory_status))
        .route("/reports/skipped", get(get_skipped_records))
}

async fn get_kpis(State(state): State<AppState>) -> Json<ApiResponse<KpiSummary>> {
    Json(ApiResponse::success(state.bundle.kpis.clone()))
}

async fn get_quality(State(state): State<AppState>) -> Json<ApiResponse<Vec<QualityIssue>>> {
    Json(ApiResponse::success(state.bundle.quality_issues.clone()))
}

async fn get_revenue_trends(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<MonthlyTrendRow>>> {
    Json(ApiResponse::success(state.bundle.revenue_trends.clone()))
}

async fn get_regional_performance(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<RegionalPerformanceRow>>> {
    Json(ApiResponse::success(
        state.bundle.regional_performance.clone(),
    ))
}

async fn get_rep_performance(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<RepPerformanceRow>>> {
    Json(ApiResponse::success(state.bundle.rep_performance.clone()))
}

async fn get_product_performance(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ProductPerformanceRow>>> {
    Json(ApiResponse::success(
        state.bundle.product_performance.clone(),
    ))
}

async fn get_seasonality(State(state): State<AppState>) -> Json<ApiResponse<SeasonalityReport>> {
    Json(ApiResponse::success(state.bundle.seasonality.clone()))
}

async fn get_customer_segments(State(state): State<AppState>) -> Json<ApiResponse<RfmReport>> {
    Json(ApiResponse::success(state.bundle.customer_rfm.clone()))
}

async fn get_inventory_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<InventoryStatusRow>>> {
    Json(ApiResponse::success(state.bundle.inventory_status.clone()))
}

async fn get_skipped_records(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<RecordIssue>>> {
    Json(ApiResponse::success(state.bundle.skipped_records.clone()))
}
