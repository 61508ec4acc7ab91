pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::recommend::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route(
            "/api/v1/recommendations",
            post(handlers::handle_recommendations),
        )
        .route("/api/v1/engine/status", get(handlers::handle_engine_status))
        .route("/api/v1/engine/cache", delete(handlers::handle_clear_cache))
        .route(
            "/api/v1/engine/reinitialize",
            post(handlers::handle_reinitialize),
        )
        // Catalog API
        .route("/api/v1/internships", get(handlers::handle_list_internships))
        .route(
            "/api/v1/internships/stats",
            get(handlers::handle_catalog_stats),
        )
        .route(
            "/api/v1/internships/:id",
            get(handlers::handle_get_internship),
        )
        .with_state(state)
}
