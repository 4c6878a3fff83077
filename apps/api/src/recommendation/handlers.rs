//! Axum route handlers for the Recommendation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::requirement::Requirement;
use crate::recommendation::ranker::RankedResult;
use crate::recommendation::refiner::RefinementOutcome;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub requirement_text: String,
    /// Defaults to the configured shortlist size when omitted.
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub results: Vec<RankedResult>,
}

#[derive(Debug, Deserialize)]
pub struct InterpretRequest {
    pub requirement_text: String,
}

#[derive(Debug, Serialize)]
pub struct InterpretResponse {
    pub requirement: Requirement,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    /// Earlier user inputs, oldest first. The caller carries this between turns.
    #[serde(default)]
    pub query_history: Vec<String>,
    pub latest_input: String,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    #[serde(flatten)]
    pub outcome: RefinementOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommendations
///
/// Full pipeline: interpret → plan → retrieve → score → rank/explain.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    if request.requirement_text.trim().is_empty() {
        return Err(AppError::Validation(
            "requirement_text cannot be empty".to_string(),
        ));
    }

    let config = state.pipeline.config();
    let top_n = request.top_n.unwrap_or(config.default_top_n);
    if top_n == 0 {
        return Err(AppError::Validation("top_n must be >= 1".to_string()));
    }
    if top_n > config.max_top_n {
        return Err(AppError::Validation(format!(
            "top_n must be <= {}",
            config.max_top_n
        )));
    }

    let results = state
        .pipeline
        .recommend(&request.requirement_text, top_n)
        .await?;

    Ok(Json(RecommendResponse { results }))
}

/// POST /api/v1/recommendations/interpret
///
/// Interprets a requirement without searching — lets the caller preview the
/// structured extraction before committing to a full run.
pub async fn handle_interpret(
    State(state): State<AppState>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<InterpretResponse>, AppError> {
    if request.requirement_text.trim().is_empty() {
        return Err(AppError::Validation(
            "requirement_text cannot be empty".to_string(),
        ));
    }

    let requirement = state.pipeline.interpret(&request.requirement_text).await?;

    Ok(Json(InterpretResponse { requirement }))
}

/// POST /api/v1/recommendations/refine
///
/// One turn of the requirement refinement loop. Returns either a refined
/// query ready to search with, or a clarifying question to show the user.
pub async fn handle_refine(
    State(state): State<AppState>,
    Json(request): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, AppError> {
    if request.latest_input.trim().is_empty() {
        return Err(AppError::Validation(
            "latest_input cannot be empty".to_string(),
        ));
    }

    let outcome = state
        .pipeline
        .refine(&request.query_history, &request.latest_input)
        .await?;

    Ok(Json(RefineResponse { outcome }))
}
