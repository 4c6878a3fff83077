//! Similarity Retriever — executes every search strategy against the vector
//! index and merges hits per candidate.
//!
//! Strategies run concurrently and are joined at a barrier; a strategy whose
//! embedding or index call fails is skipped with a warning. Retrieval as a
//! whole fails only when every strategy failed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{PipelineError, RetrievalError};
use crate::providers::{Embedder, ProviderError, VectorIndex};
use crate::recommendation::planner::SearchStrategy;

/// A single candidate surfaced by one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub candidate_id: Uuid,
    pub strategy_index: usize,
    /// Cosine similarity in [0, 1].
    pub raw_similarity: f64,
}

/// Result of the retrieval stage: every hit for every surfaced candidate,
/// plus which strategies actually produced results (the scorer normalizes
/// strategy weights over exactly that set).
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    pub hits_by_candidate: HashMap<Uuid, Vec<RetrievalHit>>,
    pub active_strategies: Vec<usize>,
}

/// Executes all strategies concurrently. Per-strategy failures are skipped;
/// `RetrievalError::AllStrategiesFailed` only when none succeed.
pub async fn retrieve(
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    strategies: &[SearchStrategy],
    top_k: usize,
    call_timeout: Duration,
) -> Result<RetrievalOutcome, PipelineError> {
    let mut tasks: JoinSet<(usize, Result<Vec<(Uuid, f32)>, ProviderError>)> = JoinSet::new();

    for (strategy_index, strategy) in strategies.iter().enumerate() {
        let embedder = Arc::clone(&embedder);
        let index = Arc::clone(&index);
        let query_text = strategy.query_text.clone();

        tasks.spawn(async move {
            let result =
                run_strategy(embedder, index, &query_text, top_k, call_timeout).await;
            (strategy_index, result)
        });
    }

    let mut outcome = RetrievalOutcome::default();
    let mut failed = 0usize;

    // Barrier: all strategies settle before merging; no failure aborts the rest.
    while let Some(joined) = tasks.join_next().await {
        let (strategy_index, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Retrieval task panicked: {e}");
                failed += 1;
                continue;
            }
        };

        match result {
            Ok(neighbors) => {
                debug!(
                    "Strategy {} returned {} neighbors",
                    strategy_index,
                    neighbors.len()
                );
                outcome.active_strategies.push(strategy_index);
                for (candidate_id, similarity) in neighbors {
                    outcome
                        .hits_by_candidate
                        .entry(candidate_id)
                        .or_default()
                        .push(RetrievalHit {
                            candidate_id,
                            strategy_index,
                            raw_similarity: f64::from(similarity).clamp(0.0, 1.0),
                        });
                }
            }
            Err(e) => {
                warn!("Strategy {strategy_index} failed, skipping: {e}");
                failed += 1;
            }
        }
    }

    if outcome.active_strategies.is_empty() {
        return Err(PipelineError::Retrieval(
            RetrievalError::AllStrategiesFailed { attempted: failed },
        ));
    }

    // JoinSet completion order is nondeterministic; restore a stable order
    // so identical inputs always produce identical downstream scoring.
    outcome.active_strategies.sort_unstable();
    for hits in outcome.hits_by_candidate.values_mut() {
        hits.sort_by(|a, b| {
            a.strategy_index
                .cmp(&b.strategy_index)
                .then(b.raw_similarity.total_cmp(&a.raw_similarity))
        });
    }

    Ok(outcome)
}

/// One strategy: embed the query text, then ask the index for neighbors.
/// Both calls share the per-call timeout.
async fn run_strategy(
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    query_text: &str,
    top_k: usize,
    call_timeout: Duration,
) -> Result<Vec<(Uuid, f32)>, ProviderError> {
    let vector = tokio::time::timeout(call_timeout, embedder.embed(query_text))
        .await
        .map_err(|_| ProviderError::Timeout { provider: "embedder" })??;

    tokio::time::timeout(call_timeout, index.query(&vector, top_k))
        .await
        .map_err(|_| ProviderError::Timeout { provider: "vector_index" })?
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::recommendation::planner::VectorSource;

    struct StubEmbedder {
        fail_on: BTreeSet<String>,
        calls: AtomicUsize,
    }

    impl StubEmbedder {
        fn new(fail_on: &[&str]) -> Self {
            Self {
                fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(text) {
                return Err(ProviderError::Unavailable {
                    provider: "embedder",
                    message: "stub failure".to_string(),
                });
            }
            Ok(vec![text.len() as f32; 4])
        }
    }

    struct StubIndex {
        neighbors: Vec<(Uuid, f32)>,
    }

    #[async_trait]
    impl VectorIndex for StubIndex {
        async fn query(
            &self,
            _vector: &[f32],
            k: usize,
        ) -> Result<Vec<(Uuid, f32)>, ProviderError> {
            Ok(self.neighbors.iter().take(k).copied().collect())
        }
    }

    fn strategy(source: VectorSource, text: &str, weight: f64) -> SearchStrategy {
        SearchStrategy {
            source,
            query_text: text.to_string(),
            weight,
        }
    }

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_merge_keeps_hits_from_every_strategy() {
        let id = Uuid::new_v4();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let index = Arc::new(StubIndex {
            neighbors: vec![(id, 0.9)],
        });
        let strategies = vec![
            strategy(VectorSource::FullText, "full text query", 0.4),
            strategy(VectorSource::Skills, "python", 0.4),
        ];

        let outcome = retrieve(embedder, index, &strategies, 10, timeout())
            .await
            .unwrap();

        let hits = &outcome.hits_by_candidate[&id];
        assert_eq!(hits.len(), 2, "one hit per strategy must survive the merge");
        assert_eq!(outcome.active_strategies, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_one_failing_strategy_is_skipped() {
        let id = Uuid::new_v4();
        let embedder = Arc::new(StubEmbedder::new(&["broken"]));
        let index = Arc::new(StubIndex {
            neighbors: vec![(id, 0.8)],
        });
        let strategies = vec![
            strategy(VectorSource::FullText, "works", 0.4),
            strategy(VectorSource::Skills, "broken", 0.4),
            strategy(VectorSource::Title, "also works", 0.2),
        ];

        let outcome = retrieve(embedder, index, &strategies, 10, timeout())
            .await
            .unwrap();

        assert_eq!(outcome.active_strategies, vec![0, 2]);
        assert_eq!(outcome.hits_by_candidate[&id].len(), 2);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_is_fatal() {
        let embedder = Arc::new(StubEmbedder::new(&["a", "b", "c"]));
        let index = Arc::new(StubIndex { neighbors: vec![] });
        let strategies = vec![
            strategy(VectorSource::FullText, "a", 0.4),
            strategy(VectorSource::Skills, "b", 0.4),
            strategy(VectorSource::Title, "c", 0.2),
        ];

        let err = retrieve(embedder, index, &strategies, 10, timeout())
            .await
            .unwrap_err();

        match err {
            PipelineError::Retrieval(RetrievalError::AllStrategiesFailed { attempted }) => {
                assert_eq!(attempted, 3)
            }
            other => panic!("expected AllStrategiesFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hits_are_ordered_by_strategy_index() {
        let id = Uuid::new_v4();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let index = Arc::new(StubIndex {
            neighbors: vec![(id, 0.7)],
        });
        let strategies = vec![
            strategy(VectorSource::FullText, "one", 0.4),
            strategy(VectorSource::Skills, "two", 0.4),
            strategy(VectorSource::Title, "three", 0.2),
        ];

        let outcome = retrieve(embedder, index, &strategies, 10, timeout())
            .await
            .unwrap();

        let indices: Vec<usize> = outcome.hits_by_candidate[&id]
            .iter()
            .map(|h| h.strategy_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_similarity_clamped_into_unit_interval() {
        let id = Uuid::new_v4();
        let embedder = Arc::new(StubEmbedder::new(&[]));
        let index = Arc::new(StubIndex {
            neighbors: vec![(id, 1.2)],
        });
        let strategies = vec![strategy(VectorSource::FullText, "query", 0.4)];

        let outcome = retrieve(embedder, index, &strategies, 10, timeout())
            .await
            .unwrap();

        assert_eq!(outcome.hits_by_candidate[&id][0].raw_similarity, 1.0);
    }
}
