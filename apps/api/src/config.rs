use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::recommend::engine::EngineConfig;

/// Application configuration loaded from environment variables.
/// Every variable has a default; the service starts with no env at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the Ollama-compatible ranking backend.
    pub ranker_base_url: String,
    pub ranker_model: String,
    pub ranker_timeout: Duration,
    pub cache_validity: Duration,
    /// Global fairness toggle; requests may override per call.
    pub fairness_boost: bool,
    /// Optional JSON dataset; the built-in sample set is used when absent.
    pub dataset_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_parse("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ranker_base_url: std::env::var("RANKER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ranker_model: std::env::var("RANKER_MODEL").unwrap_or_else(|_| "llama2".to_string()),
            ranker_timeout: Duration::from_secs(env_parse("RANKER_TIMEOUT_SECS", 30u64)?),
            cache_validity: Duration::from_secs(env_parse("CACHE_VALIDITY_SECS", 300u64)?),
            fairness_boost: env_parse("FAIRNESS_BOOST", false)?,
            dataset_path: std::env::var("INTERNSHIP_DATA_PATH").ok().map(PathBuf::from),
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cache_validity: self.cache_validity,
            fairness_boost: self.fairness_boost,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
