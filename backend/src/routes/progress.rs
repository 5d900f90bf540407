//! Body measurements, progress photos and chart data

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::foods::parse_id;
use crate::services::ProgressService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use nutrition_tracker_shared::types::{
    CreateMeasurementRequest, CreatePhotoRequest, DateRangeQuery, MeasurementResponse,
    PhotoResponse, ProgressChartResponse,
};

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/measurements", get(list_measurements).post(add_measurement))
        .route("/measurements/:id", delete(delete_measurement))
        .route("/photos", get(list_photos).post(add_photo))
        .route("/photos/:id", delete(delete_photo))
        .route("/chart", get(chart))
}

/// GET /api/v1/progress/measurements?start=&end=
async fn list_measurements(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<MeasurementResponse>>> {
    let entries =
        ProgressService::measurements(state.db(), auth.user_id, range.start, range.end).await?;
    Ok(Json(entries))
}

/// POST /api/v1/progress/measurements
///
/// A weight reading also becomes the profile weight, which can move targets.
async fn add_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateMeasurementRequest>,
) -> ApiResult<(StatusCode, Json<MeasurementResponse>)> {
    let entry =
        ProgressService::add_measurement(state.db(), state.diary_cache(), auth.user_id, req)
            .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/progress/measurements/:id
async fn delete_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "measurement id")?;
    ProgressService::delete_measurement(state.db(), state.diary_cache(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/progress/photos
async fn list_photos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<PhotoResponse>>> {
    Ok(Json(ProgressService::photos(state.db(), auth.user_id).await?))
}

/// POST /api/v1/progress/photos
async fn add_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePhotoRequest>,
) -> ApiResult<(StatusCode, Json<PhotoResponse>)> {
    let photo = ProgressService::add_photo(state.db(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

/// DELETE /api/v1/progress/photos/:id
async fn delete_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "photo id")?;
    ProgressService::delete_photo(state.db(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/progress/chart?start=&end=
async fn chart(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<ProgressChartResponse>> {
    let chart = ProgressService::chart(state.db(), auth.user_id, range.start, range.end).await?;
    Ok(Json(chart))
}
