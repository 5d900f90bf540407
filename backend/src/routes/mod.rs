//! Route definitions for the Nutrition Tracker API
//!
//! This module organizes all API routes and applies middleware.

use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod ai;
mod auth;
mod diary;
mod export;
mod foods;
mod health;
mod profile;
mod progress;
mod recipes;
mod water;

#[cfg(test)]
mod ai_tests;
#[cfg(test)]
mod auth_tests;

pub use ai::ai_routes;
pub use auth::auth_routes;
pub use diary::diary_routes;
pub use export::export_routes;
pub use foods::food_routes;
pub use profile::profile_routes;
pub use progress::progress_routes;
pub use recipes::recipe_routes;
pub use water::water_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    // Completion calls can take a while; leave them headroom on top of the
    // client's own timeout.
    let timeout = Duration::from_secs(state.config().ai.timeout_secs.max(25) + 5);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api_routes())
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "Nutrition Tracker API v1" }))
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        .nest("/foods", food_routes())
        .nest("/recipes", recipe_routes())
        .nest("/diary", diary_routes())
        .nest("/water", water_routes())
        .nest("/progress", progress_routes())
        .nest("/ai", ai_routes())
        .nest("/export", export_routes())
}
