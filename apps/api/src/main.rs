mod candidates;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod providers;
mod recommendation;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::candidates::store::PgCandidateStore;
use crate::config::{Config, PipelineConfig};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::providers::embedding::HttpEmbedder;
use crate::providers::vector_index::HttpVectorIndex;
use crate::recommendation::pipeline::RecommendationPipeline;
use crate::routes::build_router;
use crate::state::AppState;

/// Outer bound for one LLM HTTP round trip; stage-level timeouts are tighter.
const LLM_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; bad pipeline tuning must abort boot, not a request.
    let config = Config::from_env()?;
    let pipeline_config = PipelineConfig::from_env()?;
    pipeline_config.validate().map_err(anyhow::Error::from)?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shortlist API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (candidate profile store)
    let pool = create_pool(&config.database_url).await?;

    // Initialize providers
    let llm = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone(),
        LLM_HTTP_TIMEOUT,
    ));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let embedder = Arc::new(HttpEmbedder::new(
        config.embedding_api_base.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
        pipeline_config.embedding_dim,
        pipeline_config.retrieval_timeout,
    ));
    info!(
        "Embedding client initialized (model: {}, dim: {})",
        config.embedding_model, pipeline_config.embedding_dim
    );

    let index = Arc::new(HttpVectorIndex::new(
        config.vector_index_url.clone(),
        config.vector_index_collection.clone(),
        config.vector_index_api_key.clone(),
        pipeline_config.retrieval_timeout,
    ));
    info!(
        "Vector index client initialized (collection: {})",
        config.vector_index_collection
    );

    let store = Arc::new(PgCandidateStore::new(pool));

    // Build the pipeline with its immutable tuning
    info!(
        "Pipeline config: top_k={}, default_top_n={}, weights={:?}",
        pipeline_config.top_k_per_strategy, pipeline_config.default_top_n, pipeline_config.weights
    );
    let pipeline = Arc::new(RecommendationPipeline::new(
        llm,
        embedder,
        index,
        store,
        pipeline_config,
    ));

    // Build app state and router
    let state = AppState {
        config: config.clone(),
        pipeline,
    };
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
