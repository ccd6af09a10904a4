//! API Routes
//!
//! Configures the Axum router with all lookup endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_handler, health_handler, list_handler, recipes_handler, search_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /v2/:kind` - ID list, or ordered records with `?ids=`
/// - `GET /v2/:kind/:id` - A single record
/// - `GET /search/:kind` - Filter a loaded snapshot
/// - `GET /recipes/search` - Recipes by `output` or `input` item
/// - `GET /stats` - Response cache and entity cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v2/:kind", get(list_handler))
        .route("/v2/:kind/:id", get(get_handler))
        .route("/search/:kind", get(search_handler))
        .route("/recipes/search", get(recipes_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
