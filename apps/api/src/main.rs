mod catalog;
mod config;
mod errors;
mod models;
mod ranker;
mod recommend;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::ranker::OllamaRanker;
use crate::recommend::engine::RecommendationEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("pmis_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PMIS recommendation API v{}", env!("CARGO_PKG_VERSION"));

    // Load the internship catalog (dataset file or built-in samples)
    let catalog = Arc::new(Catalog::load(config.dataset_path.as_deref()));
    info!("Catalog loaded with {} internships", catalog.len());
    if catalog.is_empty() {
        warn!("Catalog is empty; every request will be served from the fallback sample set");
    }

    // External ranker capability; availability is probed at engine init
    let ranker = Arc::new(OllamaRanker::new(
        config.ranker_base_url.clone(),
        config.ranker_model.clone(),
        config.ranker_timeout,
    ));
    info!(
        "Ranker configured: {} (model: {})",
        config.ranker_base_url, config.ranker_model
    );

    // Build the engine and probe the ranker up front so the first request
    // does not pay for the health check.
    let engine = Arc::new(RecommendationEngine::new(
        catalog.clone(),
        ranker,
        config.engine_config(),
    ));
    engine.ensure_initialized().await;

    let state = AppState {
        engine,
        catalog,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
