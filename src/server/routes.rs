//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Job search (and the path older frontends call)
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/jobs_api.php", get(handlers::list_jobs))
        // Registry and store status
        .route("/api/sources", get(handlers::api_sources))
        .route("/api/status", get(handlers::api_status))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
