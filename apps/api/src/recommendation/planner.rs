//! Strategy Planner — expands a structured requirement into retrieval
//! strategies, each naming a query text and a design weight.
//!
//! Pure function, no I/O, never fails: an empty requirement degrades to a
//! single full-text strategy. Weights are design defaults and are NOT
//! normalized here — the scorer normalizes over strategies that actually
//! returned hits.

use serde::{Deserialize, Serialize};

use crate::models::requirement::Requirement;

/// Which view of the candidate pool a strategy queries against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSource {
    Skills,
    Title,
    FullText,
}

/// One way of forming a query vector to search the candidate pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStrategy {
    pub source: VectorSource,
    pub query_text: String,
    /// Design weight in [0, 1]; weights need not sum to 1 across strategies.
    pub weight: f64,
}

const FULL_TEXT_WEIGHT: f64 = 0.4;
const SKILLS_WEIGHT: f64 = 0.4;
const TITLE_WEIGHT: f64 = 0.2;

/// Phrases that mark the residual text as carrying a role title worth its
/// own vector query.
const ROLE_PHRASES: &[&str] = &[
    "engineer",
    "developer",
    "programmer",
    "architect",
    "scientist",
    "analyst",
    "designer",
    "manager",
    "lead",
    "consultant",
    "administrator",
    "specialist",
];

/// Expands `req` into an ordered strategy list:
/// full-text always, skills-only when required skills exist, title when the
/// residual contains a recognizable role phrase.
pub fn plan(req: &Requirement) -> Vec<SearchStrategy> {
    let mut strategies = Vec::with_capacity(3);

    let mut full_text_parts: Vec<&str> = Vec::new();
    let residual = req.free_text_residual.trim();
    if !residual.is_empty() {
        full_text_parts.push(residual);
    }
    full_text_parts.extend(req.required_skills.iter().map(String::as_str));

    let full_text_query = if full_text_parts.is_empty() {
        // Degraded case: nothing structured survived interpretation;
        // fall back to the raw requirement text.
        req.raw_text.trim().to_string()
    } else {
        full_text_parts.join(" ")
    };

    strategies.push(SearchStrategy {
        source: VectorSource::FullText,
        query_text: full_text_query,
        weight: FULL_TEXT_WEIGHT,
    });

    if !req.required_skills.is_empty() {
        strategies.push(SearchStrategy {
            source: VectorSource::Skills,
            query_text: req
                .required_skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            weight: SKILLS_WEIGHT,
        });
    }

    if let Some(role) = detect_role_phrase(residual) {
        strategies.push(SearchStrategy {
            source: VectorSource::Title,
            query_text: role,
            weight: TITLE_WEIGHT,
        });
    }

    strategies
}

/// Returns the phrase around the first role noun in `text`, or None when no
/// role noun occurs. Matches whole words only.
fn detect_role_phrase(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    for (i, word) in words.iter().enumerate() {
        if ROLE_PHRASES.contains(word) {
            // Take up to three words preceding the role noun, e.g.
            // "senior python backend engineer".
            let start = i.saturating_sub(3);
            return Some(words[start..=i].join(" "));
        }
    }
    None
}
