//! Recommendation pipeline — orchestrates the full flow.
//!
//! Flow: interpret → plan → retrieve → fetch profiles → score → rank/explain.
//!
//! Synchronous contract from the caller's perspective; internally the
//! retrieval and reasoning stages fan out concurrently. Each invocation owns
//! its data exclusively — the pipeline itself is stateless and can serve
//! concurrent requests with different configurations side by side.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::models::requirement::Requirement;
use crate::providers::{CandidateStore, Embedder, LanguageModel, VectorIndex};
use crate::recommendation::interpreter;
use crate::recommendation::planner;
use crate::recommendation::ranker::{self, RankedResult};
use crate::recommendation::refiner::{self, RefinementOutcome};
use crate::recommendation::retriever;
use crate::recommendation::scorer::{self, ScoredCandidate};

pub struct RecommendationPipeline {
    llm: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn CandidateStore>,
    config: PipelineConfig,
}

impl RecommendationPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn CandidateStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm,
            embedder,
            index,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Interprets a raw requirement without running retrieval — used by the
    /// preview endpoint.
    pub async fn interpret(&self, raw_text: &str) -> Result<Requirement, PipelineError> {
        Ok(interpreter::interpret(self.llm.as_ref(), raw_text).await?)
    }

    /// One requirement refinement turn (stateless; caller carries history).
    pub async fn refine(
        &self,
        query_history: &[String],
        latest_input: &str,
    ) -> Result<RefinementOutcome, PipelineError> {
        Ok(refiner::refine(self.llm.as_ref(), query_history, latest_input).await?)
    }

    /// Runs the full pipeline and returns the explained shortlist.
    pub async fn recommend(
        &self,
        raw_text: &str,
        top_n: usize,
    ) -> Result<Vec<RankedResult>, PipelineError> {
        // Stage 1: interpret. Fatal on failure — nothing to search for.
        let requirement = self.interpret(raw_text).await?;
        info!(
            "Requirement interpreted: {} required skills, min_experience={:?}",
            requirement.required_skills.len(),
            requirement.min_experience_years
        );

        // Stage 2: plan (pure, never fails).
        let strategies = planner::plan(&requirement);
        info!("Planned {} retrieval strategies", strategies.len());

        // Stage 3: concurrent retrieval with partial-failure tolerance.
        let outcome = retriever::retrieve(
            Arc::clone(&self.embedder),
            Arc::clone(&self.index),
            &strategies,
            self.config.top_k_per_strategy,
            self.config.retrieval_timeout,
        )
        .await?;
        info!(
            "Retrieved {} candidates from {} of {} strategies",
            outcome.hits_by_candidate.len(),
            outcome.active_strategies.len(),
            strategies.len()
        );

        if outcome.hits_by_candidate.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 4: join hits against stored profiles.
        let mut candidate_ids: Vec<Uuid> = outcome.hits_by_candidate.keys().copied().collect();
        candidate_ids.sort_unstable();
        let profiles = self.store.fetch_profiles(&candidate_ids).await?;

        // Stage 5: score. Pure computation; ids without a profile are dropped.
        let strategy_weights =
            scorer::normalize_strategy_weights(&strategies, &outcome.active_strategies);
        let mut scored: Vec<ScoredCandidate> = Vec::with_capacity(profiles.len());
        for (candidate_id, hits) in outcome.hits_by_candidate {
            match profiles.get(&candidate_id) {
                Some(profile) => scored.push(scorer::score_candidate(
                    profile,
                    hits,
                    &requirement,
                    &strategy_weights,
                    &self.config.weights,
                )),
                None => {
                    warn!("Candidate {candidate_id} surfaced by index but has no stored profile")
                }
            }
        }
        info!("Scored {} candidates", scored.len());

        // Stage 6: rank, truncate, explain. Never fails.
        let results = ranker::rank_and_explain(
            Arc::clone(&self.llm),
            &requirement,
            scored,
            &profiles,
            top_n,
            self.config.reasoning_timeout,
        )
        .await;
        info!("Shortlist ready: {} results", results.len());

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::errors::{InterpretationError, RetrievalError};
    use crate::models::candidate::{CandidateProfile, EducationLevel};
    use crate::providers::ProviderError;
    use crate::recommendation::prompts::EXTRACT_SYSTEM;

    const EXTRACTION: &str = r#"{
        "required_skills": ["python", "backend"],
        "optional_skills": [],
        "min_experience_years": 5,
        "education_level": "bachelor",
        "free_text_residual": "backend engineer"
    }"#;

    /// Answers extraction calls with a canned requirement and every other
    /// call with fixed reasoning prose.
    struct DualLlm;

    #[async_trait]
    impl LanguageModel for DualLlm {
        async fn complete(&self, _prompt: &str, system: &str) -> Result<String, ProviderError> {
            if system == EXTRACT_SYSTEM {
                Ok(EXTRACTION.to_string())
            } else {
                Ok("Strong match on backend skills.".to_string())
            }
        }
    }

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![text.len() as f32; 4])
        }
    }

    struct FixedIndex {
        neighbors: Vec<(Uuid, f32)>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(
            &self,
            _vector: &[f32],
            k: usize,
        ) -> Result<Vec<(Uuid, f32)>, ProviderError> {
            Ok(self.neighbors.iter().take(k).copied().collect())
        }
    }

    struct BrokenIndex;

    #[async_trait]
    impl VectorIndex for BrokenIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _k: usize,
        ) -> Result<Vec<(Uuid, f32)>, ProviderError> {
            Err(ProviderError::Unavailable {
                provider: "vector_index",
                message: "down".to_string(),
            })
        }
    }

    struct InMemoryStore {
        profiles: HashMap<Uuid, CandidateProfile>,
    }

    #[async_trait]
    impl CandidateStore for InMemoryStore {
        async fn fetch_profiles(
            &self,
            ids: &[Uuid],
        ) -> Result<HashMap<Uuid, CandidateProfile>, ProviderError> {
            Ok(ids
                .iter()
                .filter_map(|id| self.profiles.get(id).map(|p| (*id, p.clone())))
                .collect())
        }
    }

    fn profile(id: Uuid, skill_list: &[&str], years: f64) -> CandidateProfile {
        CandidateProfile {
            id,
            skills: skill_list.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
            education_level: Some(EducationLevel::Master),
        }
    }

    fn pipeline_with(
        neighbors: Vec<(Uuid, f32)>,
        profiles: HashMap<Uuid, CandidateProfile>,
    ) -> RecommendationPipeline {
        RecommendationPipeline::new(
            Arc::new(DualLlm),
            Arc::new(FixedEmbedder),
            Arc::new(FixedIndex { neighbors }),
            Arc::new(InMemoryStore { profiles }),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_recommend_end_to_end() {
        let strong = Uuid::new_v4();
        let weak = Uuid::new_v4();
        let profiles = HashMap::from([
            (strong, profile(strong, &["python", "backend", "go"], 7.0)),
            (weak, profile(weak, &["java"], 1.0)),
        ]);

        let pipeline = pipeline_with(vec![(strong, 0.95), (weak, 0.40)], profiles);
        let results = pipeline
            .recommend("5+ years python backend engineer", 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].candidate_id, strong);
        assert_eq!(results[0].rank, 1);
        assert!(results[0].combined_score > results[1].combined_score);
        assert!(!results[0].reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_is_idempotent_with_deterministic_mocks() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let profiles = HashMap::from([
            (a, profile(a, &["python", "backend"], 6.0)),
            (b, profile(b, &["python"], 3.0)),
        ]);

        let pipeline = pipeline_with(vec![(a, 0.9), (b, 0.8)], profiles);
        let first = pipeline.recommend("python backend engineer", 10).await.unwrap();
        let second = pipeline.recommend("python backend engineer", 10).await.unwrap();

        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.candidate_id, y.candidate_id);
            assert_eq!(x.rank, y.rank);
            assert_eq!(x.combined_score, y.combined_score);
        }
    }

    #[tokio::test]
    async fn test_candidate_without_profile_is_dropped() {
        let known = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let profiles = HashMap::from([(known, profile(known, &["python"], 5.0))]);

        let pipeline = pipeline_with(vec![(known, 0.9), (ghost, 0.99)], profiles);
        let results = pipeline.recommend("python engineer", 10).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidate_id, known);
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_shortlist_not_error() {
        let pipeline = pipeline_with(vec![], HashMap::new());
        let results = pipeline.recommend("python engineer", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_index_down_surfaces_all_strategies_failed() {
        let pipeline = RecommendationPipeline::new(
            Arc::new(DualLlm),
            Arc::new(FixedEmbedder),
            Arc::new(BrokenIndex),
            Arc::new(InMemoryStore {
                profiles: HashMap::new(),
            }),
            PipelineConfig::default(),
        );

        let err = pipeline.recommend("python engineer", 10).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval(RetrievalError::AllStrategiesFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unintelligible_requirement_fails_interpretation() {
        struct EmptyExtractionLlm;

        #[async_trait]
        impl LanguageModel for EmptyExtractionLlm {
            async fn complete(
                &self,
                _prompt: &str,
                _system: &str,
            ) -> Result<String, ProviderError> {
                Ok(r#"{"required_skills": [], "free_text_residual": ""}"#.to_string())
            }
        }

        let pipeline = RecommendationPipeline::new(
            Arc::new(EmptyExtractionLlm),
            Arc::new(FixedEmbedder),
            Arc::new(FixedIndex { neighbors: vec![] }),
            Arc::new(InMemoryStore {
                profiles: HashMap::new(),
            }),
            PipelineConfig::default(),
        );

        let err = pipeline.recommend("???", 10).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Interpretation(InterpretationError::EmptyRequirement)
        ));
    }

    #[tokio::test]
    async fn test_top_n_truncates_shortlist() {
        let ids: Vec<Uuid> = (0..12).map(|_| Uuid::new_v4()).collect();
        let profiles: HashMap<Uuid, CandidateProfile> = ids
            .iter()
            .map(|id| (*id, profile(*id, &["python", "backend"], 6.0)))
            .collect();
        let neighbors: Vec<(Uuid, f32)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, 0.95 - i as f32 * 0.02))
            .collect();

        let pipeline = pipeline_with(neighbors, profiles);
        let results = pipeline.recommend("python backend engineer", 5).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }
}
