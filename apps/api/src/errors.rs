use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::providers::ProviderError;

/// Requirement interpretation failures (pipeline stage 1). Fatal — the
/// pipeline aborts before retrieval.
#[derive(Debug, Error)]
pub enum InterpretationError {
    #[error("requirement contains no skills and no residual text")]
    EmptyRequirement,

    #[error("language model returned malformed extraction: {0}")]
    Malformed(String),

    #[error("language model provider failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Retrieval failures. Individual strategy failures are recovered by
/// skipping; this error only exists for the total-failure case.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("all {attempted} retrieval strategies failed")]
    AllStrategiesFailed { attempted: usize },
}

/// Typed failure of a pipeline invocation, tagged by stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("interpretation failed: {0}")]
    Interpretation(#[from] InterpretationError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("provider failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Invalid startup configuration. Raised during boot validation only,
/// never at request time.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigurationError(pub String);

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(PipelineError::Interpretation(e)) => {
                tracing::warn!("Interpretation failed: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INTERPRETATION_FAILED",
                    "Could not understand the requirement".to_string(),
                )
            }
            AppError::Pipeline(PipelineError::Retrieval(e)) => {
                tracing::error!("Retrieval failed: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "RETRIEVAL_FAILED",
                    "No candidates could be retrieved".to_string(),
                )
            }
            AppError::Pipeline(PipelineError::Provider(e)) => {
                tracing::error!("Provider failure: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    "An external provider failed".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
