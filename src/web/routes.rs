//! Route definitions for the host-UI boundary

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Engine state
        .route("/api/status", get(api::get_status))
        .route("/api/config", get(api::get_config))
        .route("/api/config", post(api::update_config))
        // Style catalog and selection
        .route("/api/styles", get(api::list_styles))
        .route("/api/colors", get(api::list_colors))
        .route("/api/selection", get(api::get_selection))
        .route("/api/selection", post(api::update_selection))
        .route("/api/selection/next", post(api::next_style))
        .route("/api/selection/prev", post(api::prev_style))
        // Session commands
        .route("/api/custom-image", post(api::set_custom_image))
        .route(
            "/api/custom-image",
            axum::routing::delete(api::clear_custom_image),
        )
        .route("/api/manual-mode", post(api::enter_manual_mode))
        .route("/api/capture", post(api::capture))
        // SSE streams
        .route("/api/stream", get(api::snapshot_stream))
        .route("/api/events", get(api::feedback_stream))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
