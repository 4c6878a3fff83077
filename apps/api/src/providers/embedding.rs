//! HTTP embedding client for an OpenAI-compatible `/embeddings` endpoint.
//!
//! Transient failures are retried twice with exponential backoff starting at
//! 200ms before surfacing to the retriever, which then decides whether the
//! owning strategy is skipped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::providers::{Embedder, ProviderError};

const MAX_RETRIES: u32 = 2;
const BACKOFF_BASE_MS: u64 = 200;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Production `Embedder` over an OpenAI-compatible embeddings API.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dim: usize,
}

impl HttpEmbedder {
    pub fn new(
        api_base: String,
        api_key: String,
        model: String,
        dim: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_base,
            api_key,
            model,
            dim,
        }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout { provider: "embedder" }
                } else {
                    ProviderError::Unavailable {
                        provider: "embedder",
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited { provider: "embedder" });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable {
                provider: "embedder",
                message: format!("status {status}: {body}"),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ProviderError::Malformed {
                provider: "embedder",
                message: e.to_string(),
            }
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(ProviderError::Malformed {
                provider: "embedder",
                message: "empty data array".to_string(),
            })?;

        if vector.len() != self.dim {
            return Err(ProviderError::Malformed {
                provider: "embedder",
                message: format!("expected dimension {}, got {}", self.dim, vector.len()),
            });
        }

        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        // Blank input never reaches the provider; a zero vector matches
        // nothing meaningfully and keeps the dimension contract.
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dim]);
        }

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    "Embedding attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.embed_once(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(ProviderError::Unavailable {
            provider: "embedder",
            message: "retries exhausted".to_string(),
        }))
    }
}
