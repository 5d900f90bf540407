//! Food diary routes
//!
//! All day reads go through the per-day cache; every write drops the
//! affected days from it.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::foods::parse_id;
use crate::services::DiaryService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use nutrition_tracker_shared::types::{
    CopySlotRequest, DateQuery, DateRangeQuery, DayResponse, FoodLogResponse, HideSlotRequest,
    LogFoodRequest, ToggleConsumedResponse, UpdateLogRequest,
};
use nutrition_tracker_shared::DayTotals;

pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/day", get(get_day))
        .route("/entries", post(log_food))
        .route("/entries/:id", put(update_entry).delete(delete_entry))
        .route("/entries/:id/toggle-consumed", post(toggle_consumed))
        .route("/hide-slot", post(hide_slot))
        .route("/copy-slot", post(copy_slot))
        .route("/totals", get(range_totals))
}

/// GET /api/v1/diary/day?date=YYYY-MM-DD
async fn get_day(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DayResponse>> {
    let day = DiaryService::get_day(
        state.db(),
        state.diary_cache(),
        auth.user_id,
        query.date,
        state.prefetch_radius(),
    )
    .await?;
    Ok(Json(day))
}

/// POST /api/v1/diary/entries
async fn log_food(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LogFoodRequest>,
) -> ApiResult<(StatusCode, Json<FoodLogResponse>)> {
    let entry = DiaryService::log_food(state.db(), state.diary_cache(), auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/v1/diary/entries/:id
async fn update_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateLogRequest>,
) -> ApiResult<Json<FoodLogResponse>> {
    let id = parse_id(&id, "entry id")?;
    let entry =
        DiaryService::update_entry(state.db(), state.diary_cache(), auth.user_id, id, req).await?;
    Ok(Json(entry))
}

/// POST /api/v1/diary/entries/:id/toggle-consumed
async fn toggle_consumed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ToggleConsumedResponse>> {
    let id = parse_id(&id, "entry id")?;
    let toggled =
        DiaryService::toggle_consumed(state.db(), state.diary_cache(), auth.user_id, id).await?;
    Ok(Json(toggled))
}

/// DELETE /api/v1/diary/entries/:id
async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "entry id")?;
    DiaryService::delete_entry(state.db(), state.diary_cache(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/diary/hide-slot
async fn hide_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<HideSlotRequest>,
) -> ApiResult<Json<DayResponse>> {
    let day = DiaryService::set_slot_hidden(
        state.db(),
        state.diary_cache(),
        auth.user_id,
        req,
        state.prefetch_radius(),
    )
    .await?;
    Ok(Json(day))
}

/// POST /api/v1/diary/copy-slot - returns the target day
async fn copy_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CopySlotRequest>,
) -> ApiResult<Json<DayResponse>> {
    let day = DiaryService::copy_slot(
        state.db(),
        state.diary_cache(),
        auth.user_id,
        req,
        state.prefetch_radius(),
    )
    .await?;
    Ok(Json(day))
}

/// GET /api/v1/diary/totals?start=&end=
async fn range_totals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> ApiResult<Json<Vec<DayTotals>>> {
    let totals = DiaryService::range_totals(state.db(), auth.user_id, range.start, range.end).await?;
    Ok(Json(totals))
}
