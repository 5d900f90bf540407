//! Water intake routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::foods::parse_id;
use crate::services::WaterService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use nutrition_tracker_shared::types::{LogWaterRequest, WaterLogResponse};

pub fn water_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(add_water))
        .route("/:id", delete(delete_water))
}

/// POST /api/v1/water
async fn add_water(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LogWaterRequest>,
) -> ApiResult<(StatusCode, Json<WaterLogResponse>)> {
    let entry = WaterService::add(state.db(), state.diary_cache(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/water/:id
async fn delete_water(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "water entry id")?;
    WaterService::delete(state.db(), state.diary_cache(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
