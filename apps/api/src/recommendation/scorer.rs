//! Multi-Dimensional Scorer — recomputes a normalized score per candidate
//! across four independent dimensions and combines them into one number.
//!
//! Pure computation: no I/O, deterministic for identical inputs. Strategy
//! weights are normalized to sum 1 across the strategies that actually
//! returned results before the semantic dimension is computed.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ConfigurationError;
use crate::models::candidate::CandidateProfile;
use crate::models::requirement::Requirement;
use crate::recommendation::planner::SearchStrategy;
use crate::recommendation::retriever::RetrievalHit;

/// Partial credit for a matched optional skill, relative to a required one.
const OPTIONAL_SKILL_CREDIT: f64 = 0.5;
/// Education below the required level scores this instead of 0 so an
/// otherwise-strong candidate is not discarded outright.
const EDUCATION_PENALTY: f64 = 0.3;
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Dimension weights for the combined score. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub skill_match: f64,
    pub experience_fit: f64,
    pub education_fit: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.4,
            skill_match: 0.3,
            experience_fit: 0.2,
            education_fit: 0.1,
        }
    }
}

impl ScoringWeights {
    /// Fails closed when the weights do not sum to 1.0 ± 1e-6.
    /// Called at startup; scoring never re-validates per request.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let sum = self.semantic + self.skill_match + self.experience_fit + self.education_fit;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        if [
            self.semantic,
            self.skill_match,
            self.experience_fit,
            self.education_fit,
        ]
        .iter()
        .any(|w| *w < 0.0)
        {
            return Err(ConfigurationError(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The four normalized sub-scores, each in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScores {
    pub semantic: f64,
    pub skill_match: f64,
    pub experience_fit: f64,
    pub education_fit: f64,
}

/// One candidate with its dimension scores and the hits that surfaced it.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate_id: Uuid,
    pub dimensions: DimensionScores,
    pub combined_score: f64,
    pub supporting_hits: Vec<RetrievalHit>,
}

/// Normalizes the design weights of `active` strategies to sum 1.
/// Returns an empty map when no strategy is active or all weights are zero.
pub fn normalize_strategy_weights(
    strategies: &[SearchStrategy],
    active: &[usize],
) -> HashMap<usize, f64> {
    let total: f64 = active
        .iter()
        .filter_map(|i| strategies.get(*i))
        .map(|s| s.weight)
        .sum();
    if total <= 0.0 {
        return HashMap::new();
    }
    active
        .iter()
        .filter_map(|i| strategies.get(*i).map(|s| (*i, s.weight / total)))
        .collect()
}

/// Scores one candidate against the requirement.
///
/// `strategy_weights` must be the output of [`normalize_strategy_weights`]
/// for the strategies that returned results this invocation.
pub fn score_candidate(
    profile: &CandidateProfile,
    hits: Vec<RetrievalHit>,
    req: &Requirement,
    strategy_weights: &HashMap<usize, f64>,
    weights: &ScoringWeights,
) -> ScoredCandidate {
    let dimensions = DimensionScores {
        semantic: semantic_score(&hits, strategy_weights),
        skill_match: skill_match_score(profile, req),
        experience_fit: experience_fit_score(profile, req),
        education_fit: education_fit_score(profile, req),
    };

    let combined_score = (weights.semantic * dimensions.semantic
        + weights.skill_match * dimensions.skill_match
        + weights.experience_fit * dimensions.experience_fit
        + weights.education_fit * dimensions.education_fit)
        .clamp(0.0, 1.0);

    ScoredCandidate {
        candidate_id: profile.id,
        dimensions,
        combined_score,
        supporting_hits: hits,
    }
}

/// Weighted average of per-strategy similarity. Several hits from the same
/// strategy are averaged within it first, keeping the result in [0, 1].
/// Accumulation runs in strategy-index order so float summation is
/// reproducible across runs.
fn semantic_score(hits: &[RetrievalHit], strategy_weights: &HashMap<usize, f64>) -> f64 {
    let mut per_strategy: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for hit in hits {
        let entry = per_strategy.entry(hit.strategy_index).or_insert((0.0, 0));
        entry.0 += hit.raw_similarity;
        entry.1 += 1;
    }

    let mut score = 0.0;
    for (strategy_index, (sum, count)) in per_strategy {
        if let Some(weight) = strategy_weights.get(&strategy_index) {
            score += weight * (sum / count as f64);
        }
    }
    score.clamp(0.0, 1.0)
}

/// Required-skill coverage with half credit for matched optional skills,
/// capped at 1.
fn skill_match_score(profile: &CandidateProfile, req: &Requirement) -> f64 {
    let denominator = req.required_skills.len().max(1) as f64;
    let required_matched = req
        .required_skills
        .iter()
        .filter(|s| profile.skills.contains(*s))
        .count() as f64;
    let optional_matched = req
        .optional_skills
        .iter()
        .filter(|s| profile.skills.contains(*s))
        .count() as f64;

    ((required_matched + OPTIONAL_SKILL_CREDIT * optional_matched) / denominator).min(1.0)
}

/// 1.0 at or above the minimum (or with no minimum); linear decay below it.
fn experience_fit_score(profile: &CandidateProfile, req: &Requirement) -> f64 {
    match req.min_experience_years {
        None => 1.0,
        Some(min) if min <= 0.0 => 1.0,
        Some(min) => {
            if profile.experience_years >= min {
                1.0
            } else {
                (profile.experience_years / min).clamp(0.0, 1.0)
            }
        }
    }
}

/// 1.0 when the profile meets or exceeds the required level on the ordinal
/// scale; a fixed penalty otherwise (including an unknown profile level).
fn education_fit_score(profile: &CandidateProfile, req: &Requirement) -> f64 {
    match req.education_level {
        None => 1.0,
        Some(required) => match profile.education_level {
            Some(level) if level >= required => 1.0,
            _ => EDUCATION_PENALTY,
        },
    }
}
