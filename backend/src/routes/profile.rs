//! Profile and macro target routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{DiaryService, ProfileService};
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use nutrition_tracker_shared::types::{ProfileResponse, UpdateProfileRequest};
use nutrition_tracker_shared::MacroTargets;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/targets", get(get_targets))
}

/// GET /api/v1/profile
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(ProfileService::get(state.db(), auth.user_id).await?))
}

/// PUT /api/v1/profile
///
/// Targets may change, so every cached day of the user is dropped.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = ProfileService::update(state.db(), auth.user_id, req).await?;
    DiaryService::invalidate_user(state.diary_cache(), auth.user_id).await;
    Ok(Json(profile))
}

/// GET /api/v1/profile/targets
async fn get_targets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MacroTargets>> {
    Ok(Json(ProfileService::targets(state.db(), auth.user_id).await?))
}
