//! AI proxy routes
//!
//! Thin wrappers over the completion client. A model answer without usable
//! JSON comes back as a 500 carrying the raw text.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::ai::MAX_IMAGE_BASE64_LEN;
use crate::services::{AiService, ProfileService};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use nutrition_tracker_shared::types::{
    AiFoodSearchRequest, AiFoodSearchResponse, AiFoodSuggestion, DietPlanRequest,
    DietPlanResponse, RefineUnitRequest, RefineUnitResponse, ScanLabelRequest,
};

/// Request body allowed for a label photo: the largest image plus room for
/// the JSON around it
const SCAN_LABEL_BODY_LIMIT: usize = MAX_IMAGE_BASE64_LEN + 64 * 1024;

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/food-search", post(food_search))
        .route(
            "/scan-label",
            post(scan_label).layer(DefaultBodyLimit::max(SCAN_LABEL_BODY_LIMIT)),
        )
        .route("/refine-unit", post(refine_unit))
        .route("/diet-plan", post(diet_plan))
}

/// POST /api/v1/ai/food-search
async fn food_search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<AiFoodSearchRequest>,
) -> ApiResult<Json<AiFoodSearchResponse>> {
    Ok(Json(AiService::food_search(state.ai()?, req).await?))
}

/// POST /api/v1/ai/scan-label
async fn scan_label(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<ScanLabelRequest>,
) -> ApiResult<Json<AiFoodSuggestion>> {
    Ok(Json(AiService::scan_label(state.ai()?, req).await?))
}

/// POST /api/v1/ai/refine-unit
async fn refine_unit(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<RefineUnitRequest>,
) -> ApiResult<Json<RefineUnitResponse>> {
    Ok(Json(AiService::refine_unit(state.ai()?, req).await?))
}

/// POST /api/v1/ai/diet-plan - planned against the user's current targets
async fn diet_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<DietPlanRequest>,
) -> ApiResult<Json<DietPlanResponse>> {
    let client = state.ai()?;
    let targets = ProfileService::targets(state.db(), auth.user_id).await?;
    Ok(Json(AiService::diet_plan(client, req, targets).await?))
}
