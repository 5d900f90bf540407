//! Food database routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::foods::parse_id;
use crate::services::{DiaryService, FoodService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use nutrition_tracker_shared::portions::ServingSize;
use nutrition_tracker_shared::types::{
    CreateFoodRequest, FoodItemResponse, FoodSearchQuery, UpdateFoodRequest,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_own_foods).post(create_food))
        .route("/search", get(search_foods))
        .route("/:id", get(get_food).put(update_food).delete(delete_food))
        .route("/:id/servings", get(get_servings))
}

/// GET /api/v1/foods/search?q=&limit=
async fn search_foods(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FoodSearchQuery>,
) -> ApiResult<Json<Vec<FoodItemResponse>>> {
    let foods = FoodService::search(state.db(), auth.user_id, &query.q, query.limit).await?;
    Ok(Json(foods))
}

/// GET /api/v1/foods - foods created by the user
async fn list_own_foods(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<FoodItemResponse>>> {
    Ok(Json(FoodService::list_own(state.db(), auth.user_id).await?))
}

/// POST /api/v1/foods
async fn create_food(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFoodRequest>,
) -> ApiResult<(StatusCode, Json<FoodItemResponse>)> {
    let food = FoodService::create(state.db(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

/// GET /api/v1/foods/:id
async fn get_food(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FoodItemResponse>> {
    let id = parse_id(&id, "food id")?;
    Ok(Json(FoodService::get(state.db(), auth.user_id, id).await?))
}

/// GET /api/v1/foods/:id/servings
async fn get_servings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ServingSize>>> {
    let id = parse_id(&id, "food id")?;
    Ok(Json(FoodService::servings(state.db(), auth.user_id, id).await?))
}

/// PUT /api/v1/foods/:id
///
/// Other users may have logged a public food, so the whole day cache goes.
async fn update_food(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateFoodRequest>,
) -> ApiResult<Json<FoodItemResponse>> {
    let id = parse_id(&id, "food id")?;
    let food = FoodService::update(state.db(), auth.user_id, id, req).await?;
    DiaryService::invalidate_all(state.diary_cache()).await;
    Ok(Json(food))
}

/// DELETE /api/v1/foods/:id - only foods nobody has used
async fn delete_food(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "food id")?;
    FoodService::delete(state.db(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
