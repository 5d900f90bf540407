//! Recipe routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::foods::parse_id;
use crate::services::{DiaryService, RecipeService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use nutrition_tracker_shared::types::{
    CreateRecipeRequest, IngredientInput, RecipeDetailResponse, RecipeResponse,
    UpdateRecipeRequest,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/:id", get(get_recipe).put(update_recipe).delete(delete_recipe))
        .route("/:id/ingredients", post(add_ingredient))
        .route("/:id/ingredients/:ingredient_id", delete(remove_ingredient))
}

/// GET /api/v1/recipes
async fn list_recipes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<RecipeResponse>>> {
    Ok(Json(RecipeService::list(state.db(), auth.user_id).await?))
}

/// POST /api/v1/recipes
async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeDetailResponse>)> {
    let recipe = RecipeService::create(state.db(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// GET /api/v1/recipes/:id
async fn get_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let id = parse_id(&id, "recipe id")?;
    Ok(Json(RecipeService::get(state.db(), auth.user_id, id).await?))
}

/// PUT /api/v1/recipes/:id
async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let id = parse_id(&id, "recipe id")?;
    let recipe = RecipeService::update(state.db(), auth.user_id, id, req).await?;
    DiaryService::invalidate_user(state.diary_cache(), auth.user_id).await;
    Ok(Json(recipe))
}

/// DELETE /api/v1/recipes/:id - 409 while diary entries log the recipe
async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "recipe id")?;
    RecipeService::delete(state.db(), auth.user_id, id).await?;
    DiaryService::invalidate_user(state.diary_cache(), auth.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/recipes/:id/ingredients
async fn add_ingredient(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<IngredientInput>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let id = parse_id(&id, "recipe id")?;
    let recipe = RecipeService::add_ingredient(state.db(), auth.user_id, id, req).await?;
    DiaryService::invalidate_user(state.diary_cache(), auth.user_id).await;
    Ok(Json(recipe))
}

/// DELETE /api/v1/recipes/:id/ingredients/:ingredient_id
async fn remove_ingredient(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, ingredient_id)): Path<(String, String)>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let id = parse_id(&id, "recipe id")?;
    let ingredient_id = parse_id(&ingredient_id, "ingredient id")?;
    let recipe =
        RecipeService::remove_ingredient(state.db(), auth.user_id, id, ingredient_id).await?;
    DiaryService::invalidate_user(state.diary_cache(), auth.user_id).await;
    Ok(Json(recipe))
}
