use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::recommend::engine::RecommendationEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The recommendation engine: one explicit instance per process, no
    /// global singleton.
    pub engine: Arc<RecommendationEngine>,
    pub catalog: Arc<Catalog>,
    pub config: Config,
}
