//! Axum route handlers for the recommendation and catalog APIs.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogFilter, CatalogStats, Internship};
use crate::errors::AppError;
use crate::recommend::engine::EngineStatus;
use crate::recommend::ScoredRecommendation;
use crate::models::profile::UserProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub profile: UserProfile,
    #[serde(default)]
    pub force_refresh: bool,
    /// Per-call fairness override; absent means "use the global toggle".
    #[serde(default)]
    pub fairness: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<ScoredRecommendation>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct InternshipsResponse {
    pub internships: Vec<Internship>,
    pub total: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommendations
///
/// Runs the full pipeline for the submitted profile. Cannot fail: the
/// engine degrades through its fallback tiers instead of erroring.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationsRequest>,
) -> Json<RecommendationsResponse> {
    let recommendations = state
        .engine
        .generate_recommendations(&request.profile, request.force_refresh, request.fairness)
        .await;

    Json(RecommendationsResponse {
        count: recommendations.len(),
        recommendations,
    })
}

/// GET /api/v1/engine/status
pub async fn handle_engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status())
}

/// DELETE /api/v1/engine/cache
pub async fn handle_clear_cache(State(state): State<AppState>) -> Json<EngineStatus> {
    state.engine.clear_cache();
    Json(state.engine.status())
}

/// POST /api/v1/engine/reinitialize
///
/// Re-probes the external ranker. Outside of this, the availability flag
/// is cached for the process lifetime.
pub async fn handle_reinitialize(State(state): State<AppState>) -> Json<EngineStatus> {
    state.engine.reinitialize().await;
    Json(state.engine.status())
}

/// GET /api/v1/internships
///
/// Filtered catalog listing; all query parameters are optional.
pub async fn handle_list_internships(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Json<InternshipsResponse> {
    let internships = state.catalog.filter(&filter);
    Json(InternshipsResponse {
        total: internships.len(),
        internships,
    })
}

/// GET /api/v1/internships/stats
pub async fn handle_catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.catalog.stats())
}

/// GET /api/v1/internships/:id
pub async fn handle_get_internship(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Internship>, AppError> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Internship {id} not found")))
}
