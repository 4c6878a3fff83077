//! Rank Aggregator & Explainer — orders scored candidates and attaches a
//! human-readable justification to each retained one.
//!
//! Ordering is a total order: combined score descending, candidate id
//! ascending on ties. Ranks are assigned BEFORE reasoning generation starts,
//! so the unreliable LLM can never affect placement — a failed or timed-out
//! reasoning call degrades to a deterministic fallback string.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinSet;
use tracing::warn;
use uuid::Uuid;

use crate::models::candidate::CandidateProfile;
use crate::models::requirement::Requirement;
use crate::providers::LanguageModel;
use crate::recommendation::prompts::{REASONING_PROMPT_TEMPLATE, REASONING_SYSTEM};
use crate::recommendation::scorer::{DimensionScores, ScoredCandidate};

/// One entry of the final shortlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub candidate_id: Uuid,
    /// 1-based position in the shortlist.
    pub rank: u32,
    pub combined_score: f64,
    pub dimension_scores: DimensionScores,
    pub reasoning: String,
    /// Profile echoed so the caller needs no second fetch.
    pub profile: CandidateProfile,
}

/// Sorts, truncates to `top_n` and generates reasoning concurrently.
/// Never fails: reasoning degrades to fallback text per candidate.
pub async fn rank_and_explain(
    llm: Arc<dyn LanguageModel>,
    req: &Requirement,
    mut scored: Vec<ScoredCandidate>,
    profiles: &HashMap<Uuid, CandidateProfile>,
    top_n: usize,
    reasoning_timeout: Duration,
) -> Vec<RankedResult> {
    scored.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then(a.candidate_id.cmp(&b.candidate_id))
    });
    scored.truncate(top_n);

    // Ranks and all prompt/fallback material are fixed here; the LLM tasks
    // below only ever fill in prose.
    let mut results: Vec<RankedResult> = Vec::with_capacity(scored.len());
    let mut prompts: Vec<String> = Vec::with_capacity(scored.len());

    for candidate in scored {
        let profile = match profiles.get(&candidate.candidate_id) {
            Some(profile) => profile.clone(),
            // Scoring requires a profile, so this cannot normally happen.
            None => {
                warn!(
                    "Candidate {} has no profile, dropping from shortlist",
                    candidate.candidate_id
                );
                continue;
            }
        };

        prompts.push(build_reasoning_prompt(req, &profile, &candidate.dimensions));
        results.push(RankedResult {
            candidate_id: candidate.candidate_id,
            rank: (results.len() + 1) as u32,
            combined_score: candidate.combined_score,
            reasoning: fallback_reasoning(req, &profile, &candidate.dimensions),
            dimension_scores: candidate.dimensions,
            profile,
        });
    }

    let mut tasks: JoinSet<(usize, Option<String>)> = JoinSet::new();
    for (position, prompt) in prompts.into_iter().enumerate() {
        let llm = Arc::clone(&llm);
        tasks.spawn(async move {
            let reasoning =
                match tokio::time::timeout(reasoning_timeout, llm.complete(&prompt, REASONING_SYSTEM))
                    .await
                {
                    Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
                    Ok(Ok(_)) => None,
                    Ok(Err(e)) => {
                        warn!("Reasoning generation failed, using fallback: {e}");
                        None
                    }
                    Err(_) => {
                        warn!("Reasoning generation timed out, using fallback");
                        None
                    }
                };
            (position, reasoning)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, Some(reasoning))) => {
                if let Some(result) = results.get_mut(position) {
                    result.reasoning = reasoning;
                }
            }
            Ok((_, None)) => {} // fallback already in place
            Err(e) => warn!("Reasoning task panicked, keeping fallback: {e}"),
        }
    }

    results
}

fn build_reasoning_prompt(
    req: &Requirement,
    profile: &CandidateProfile,
    dimensions: &DimensionScores,
) -> String {
    let profile_json = json!({
        "skills": profile.skills,
        "experience_years": profile.experience_years,
        "education_level": profile.education_level,
    });
    let scores_json = json!({
        "semantic": dimensions.semantic,
        "skill_match": dimensions.skill_match,
        "experience_fit": dimensions.experience_fit,
        "education_fit": dimensions.education_fit,
    });

    REASONING_PROMPT_TEMPLATE
        .replace("{requirement_text}", &req.raw_text)
        .replace("{profile_json}", &profile_json.to_string())
        .replace("{scores_json}", &scores_json.to_string())
}

/// Deterministic justification built purely from the dimension scores:
/// matched skills, gaps, experience and education fit.
fn fallback_reasoning(
    req: &Requirement,
    profile: &CandidateProfile,
    dimensions: &DimensionScores,
) -> String {
    let matched: Vec<&str> = req
        .required_skills
        .iter()
        .filter(|s| profile.skills.contains(*s))
        .map(String::as_str)
        .collect();
    let missing: Vec<&str> = req
        .required_skills
        .iter()
        .filter(|s| !profile.skills.contains(*s))
        .map(String::as_str)
        .collect();

    let mut parts: Vec<String> = Vec::new();

    if matched.is_empty() {
        parts.push("No required skills matched directly".to_string());
    } else {
        parts.push(format!("Matches required skills: {}", matched.join(", ")));
    }
    if !missing.is_empty() {
        parts.push(format!("missing: {}", missing.join(", ")));
    }

    if dimensions.experience_fit >= 1.0 {
        parts.push(format!(
            "experience ({:.1} years) meets the requirement",
            profile.experience_years
        ));
    } else {
        parts.push(format!(
            "experience ({:.1} years) falls short of the requirement",
            profile.experience_years
        ));
    }

    if req.education_level.is_some() {
        if dimensions.education_fit >= 1.0 {
            parts.push("education meets the requirement".to_string());
        } else {
            parts.push("education is below the requested level".to_string());
        }
    }

    format!("{}.", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use crate::models::candidate::EducationLevel;
    use crate::providers::ProviderError;

    struct FixedLlm(String);

    #[async_trait]
    impl LanguageModel for FixedLlm {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable {
                provider: "language_model",
                message: "down".to_string(),
            })
        }
    }

    fn requirement() -> Requirement {
        Requirement {
            raw_text: "python backend engineer".to_string(),
            required_skills: ["python", "backend"].iter().map(|s| s.to_string()).collect(),
            optional_skills: BTreeSet::new(),
            min_experience_years: Some(5.0),
            education_level: Some(EducationLevel::Bachelor),
            free_text_residual: "backend engineer".to_string(),
        }
    }

    fn profile_for(id: Uuid) -> CandidateProfile {
        CandidateProfile {
            id,
            skills: ["python"].iter().map(|s| s.to_string()).collect(),
            experience_years: 7.0,
            education_level: Some(EducationLevel::Master),
        }
    }

    fn scored(id: Uuid, combined: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate_id: id,
            dimensions: DimensionScores {
                semantic: combined,
                skill_match: 0.5,
                experience_fit: 1.0,
                education_fit: 1.0,
            },
            combined_score: combined,
            supporting_hits: vec![],
        }
    }

    fn pool(ids: &[Uuid]) -> HashMap<Uuid, CandidateProfile> {
        ids.iter().map(|id| (*id, profile_for(*id))).collect()
    }

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_order_is_score_desc_then_id_asc() {
        let mut ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        ids.sort();

        // Two tied candidates plus one clear winner, shuffled on input.
        let scored_pool = vec![
            scored(ids[2], 0.5),
            scored(ids[0], 0.5),
            scored(ids[1], 0.9),
        ];
        let profiles = pool(&ids);

        let results = rank_and_explain(
            Arc::new(FixedLlm("fine candidate".to_string())),
            &requirement(),
            scored_pool,
            &profiles,
            10,
            timeout(),
        )
        .await;

        assert_eq!(results[0].candidate_id, ids[1]);
        // Tie at 0.5 broken by ascending id.
        assert_eq!(results[1].candidate_id, ids[0]);
        assert_eq!(results[2].candidate_id, ids[2]);
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_truncates_to_top_n_with_contiguous_ranks() {
        let ids: Vec<Uuid> = (0..12).map(|_| Uuid::new_v4()).collect();
        let scored_pool: Vec<ScoredCandidate> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| scored(*id, 1.0 - i as f64 * 0.05))
            .collect();
        let profiles = pool(&ids);

        let results = rank_and_explain(
            Arc::new(FixedLlm("ok".to_string())),
            &requirement(),
            scored_pool,
            &profiles,
            5,
            timeout(),
        )
        .await;

        assert_eq!(results.len(), 5);
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        for pair in results.windows(2) {
            assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }

    #[tokio::test]
    async fn test_reasoning_failure_falls_back_without_changing_order() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let scored_pool: Vec<ScoredCandidate> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| scored(*id, 0.9 - i as f64 * 0.1))
            .collect();
        let profiles = pool(&ids);

        let with_llm = rank_and_explain(
            Arc::new(FixedLlm("generated".to_string())),
            &requirement(),
            scored_pool.clone(),
            &profiles,
            10,
            timeout(),
        )
        .await;
        let with_failure = rank_and_explain(
            Arc::new(FailingLlm),
            &requirement(),
            scored_pool,
            &profiles,
            10,
            timeout(),
        )
        .await;

        assert_eq!(with_llm.len(), with_failure.len());
        for (a, b) in with_llm.iter().zip(with_failure.iter()) {
            assert_eq!(a.candidate_id, b.candidate_id);
            assert_eq!(a.rank, b.rank);
            assert_eq!(a.combined_score, b.combined_score);
        }
        assert_eq!(with_llm[0].reasoning, "generated");
        assert!(with_failure[0].reasoning.contains("python"));
    }

    #[tokio::test]
    async fn test_fallback_lists_matched_and_missing_skills() {
        let id = Uuid::new_v4();
        let req = requirement();
        let profile = profile_for(id);
        let dims = DimensionScores {
            semantic: 0.5,
            skill_match: 0.5,
            experience_fit: 1.0,
            education_fit: 1.0,
        };

        let text = fallback_reasoning(&req, &profile, &dims);
        assert!(text.contains("python"));
        assert!(text.contains("missing: backend"));
        assert!(text.contains("experience"));
    }

    #[tokio::test]
    async fn test_empty_pool_yields_empty_shortlist() {
        let results = rank_and_explain(
            Arc::new(FixedLlm("x".to_string())),
            &requirement(),
            vec![],
            &HashMap::new(),
            10,
            timeout(),
        )
        .await;
        assert!(results.is_empty());
    }
}
