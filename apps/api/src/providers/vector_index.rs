//! HTTP client for the candidate vector index.
//!
//! Speaks a Qdrant-style `points/search` contract: POST a query vector and a
//! limit, get back scored point ids, nearest first. Scores are cosine
//! similarities; anything outside [0, 1] is clamped before it reaches the
//! scorer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::providers::{ProviderError, VectorIndex};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Uuid,
    score: f32,
}

/// Production `VectorIndex` over an HTTP vector search service.
#[derive(Clone)]
pub struct HttpVectorIndex {
    client: Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

impl HttpVectorIndex {
    pub fn new(
        base_url: String,
        collection: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            collection,
            api_key,
        }
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Uuid, f32)>, ProviderError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url.trim_end_matches('/'),
            self.collection
        );

        let mut request = self.client.post(&url).json(&SearchRequest {
            vector,
            limit: k,
            with_payload: false,
        });
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout { provider: "vector_index" }
            } else {
                ProviderError::Unavailable {
                    provider: "vector_index",
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable {
                provider: "vector_index",
                message: format!("status {status}: {body}"),
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            ProviderError::Malformed {
                provider: "vector_index",
                message: e.to_string(),
            }
        })?;

        Ok(parsed
            .result
            .into_iter()
            .map(|p| (p.id, p.score.clamp(0.0, 1.0)))
            .collect())
    }
}
