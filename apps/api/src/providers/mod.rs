//! External collaborator seams: embeddings, vector index, language model,
//! candidate profile store.
//!
//! The recommendation pipeline only ever talks to these traits. Production
//! implementations live in this module and `llm_client`; tests substitute
//! deterministic in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::CandidateProfile;

pub mod embedding;
pub mod vector_index;

/// Failure of a single external provider call.
///
/// `Unavailable`, `RateLimited` and `Timeout` are transient and eligible for
/// retry; `Malformed` means the provider answered but the payload is unusable.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: &'static str, message: String },

    #[error("{provider} rate limited")]
    RateLimited { provider: &'static str },

    #[error("{provider} returned malformed response: {message}")]
    Malformed { provider: &'static str, message: String },

    #[error("{provider} call timed out")]
    Timeout { provider: &'static str },
}

impl ProviderError {
    /// True for failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Unavailable { .. }
                | ProviderError::RateLimited { .. }
                | ProviderError::Timeout { .. }
        )
    }
}

/// Language model completion provider (requirement extraction, reasoning).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the raw text completion for `prompt` under `system`.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, ProviderError>;
}

/// Text embedding provider. Vectors have the fixed dimension configured at
/// startup (`PipelineConfig::embedding_dim`).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Approximate-nearest-neighbor index over candidate embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-k nearest candidates for `vector`, nearest first, with cosine
    /// similarity in [0, 1].
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Uuid, f32)>, ProviderError>;
}

/// Read access to the structured profiles produced by resume ingestion.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Fetches profiles for the given candidate ids. Ids with no stored
    /// profile are simply absent from the result.
    async fn fetch_profiles(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, CandidateProfile>, ProviderError>;
}
