use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::ConfigurationError;
use crate::recommendation::scorer::ScoringWeights;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub embedding_api_base: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub vector_index_url: String,
    pub vector_index_collection: String,
    pub vector_index_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_api_base: require_env("EMBEDDING_API_BASE")?,
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            vector_index_url: require_env("VECTOR_INDEX_URL")?,
            vector_index_collection: std::env::var("VECTOR_INDEX_COLLECTION")
                .unwrap_or_else(|_| "candidates".to_string()),
            vector_index_api_key: std::env::var("VECTOR_INDEX_API_KEY").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Immutable pipeline tuning, passed into components at construction.
/// Two pipelines with different configs can run side by side without
/// cross-talk; nothing here is ambient or mutable.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub embedding_dim: usize,
    pub top_k_per_strategy: usize,
    pub weights: ScoringWeights,
    pub retrieval_timeout: Duration,
    pub reasoning_timeout: Duration,
    pub default_top_n: usize,
    pub max_top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 1024,
            top_k_per_strategy: 50,
            weights: ScoringWeights::default(),
            retrieval_timeout: Duration::from_secs(10),
            reasoning_timeout: Duration::from_secs(20),
            default_top_n: 10,
            max_top_n: 50,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = PipelineConfig::default();

        Ok(PipelineConfig {
            embedding_dim: env_or("EMBEDDING_DIM", defaults.embedding_dim)?,
            top_k_per_strategy: env_or("TOP_K_PER_STRATEGY", defaults.top_k_per_strategy)?,
            weights: ScoringWeights {
                semantic: env_or("WEIGHT_SEMANTIC", defaults.weights.semantic)?,
                skill_match: env_or("WEIGHT_SKILL_MATCH", defaults.weights.skill_match)?,
                experience_fit: env_or("WEIGHT_EXPERIENCE_FIT", defaults.weights.experience_fit)?,
                education_fit: env_or("WEIGHT_EDUCATION_FIT", defaults.weights.education_fit)?,
            },
            retrieval_timeout: Duration::from_secs(env_or("RETRIEVAL_TIMEOUT_SECS", 10u64)?),
            reasoning_timeout: Duration::from_secs(env_or("REASONING_TIMEOUT_SECS", 20u64)?),
            default_top_n: env_or("DEFAULT_TOP_N", defaults.default_top_n)?,
            max_top_n: env_or("MAX_TOP_N", defaults.max_top_n)?,
        })
    }

    /// Startup validation: a bad configuration aborts boot, it never fails a
    /// request later.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.weights.validate()?;
        if self.embedding_dim == 0 {
            return Err(ConfigurationError("embedding_dim must be >= 1".to_string()));
        }
        if self.top_k_per_strategy == 0 {
            return Err(ConfigurationError(
                "top_k_per_strategy must be >= 1".to_string(),
            ));
        }
        if self.default_top_n == 0 {
            return Err(ConfigurationError("default_top_n must be >= 1".to_string()));
        }
        if self.default_top_n > self.max_top_n {
            return Err(ConfigurationError(format!(
                "default_top_n ({}) exceeds max_top_n ({})",
                self.default_top_n, self.max_top_n
            )));
        }
        if self.retrieval_timeout.is_zero() || self.reasoning_timeout.is_zero() {
            return Err(ConfigurationError("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
