//! Data export API routes

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::ExportService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};
use nutrition_tracker_shared::types::DateRangeQuery;

/// Create export routes
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/food-logs.csv", get(export_food_logs))
        .route("/daily-totals.csv", get(export_daily_totals))
}

fn csv_attachment(filename: &str, body: String) -> Result<impl IntoResponse, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid header value: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok((headers, body))
}

/// GET /api/v1/export/food-logs.csv?start=&end= - one row per diary entry
async fn export_food_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = ExportService::food_logs_csv(state.db(), auth.user_id, range.start, range.end).await?;
    csv_attachment(
        &format!("food-logs-{}-{}.csv", range.start, range.end),
        csv,
    )
}

/// GET /api/v1/export/daily-totals.csv?start=&end= - one row per day
async fn export_daily_totals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let csv =
        ExportService::daily_totals_csv(state.db(), auth.user_id, range.start, range.end).await?;
    csv_attachment(
        &format!("daily-totals-{}-{}.csv", range.start, range.end),
        csv,
    )
}
