use std::sync::Arc;

use crate::config::Config;
use crate::recommendation::pipeline::RecommendationPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// The pipeline owns its provider handles and immutable tuning; handlers
    /// only ever call it.
    pub pipeline: Arc<RecommendationPipeline>,
}
