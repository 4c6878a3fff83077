//! Requirement Interpreter — turns a free-text hiring requirement into a
//! structured `Requirement` via one LLM extraction call.
//!
//! The provider call is retried up to twice (transient failure or malformed
//! JSON); an extraction with zero skills and no residual text is rejected as
//! `EmptyRequirement` without retry, since the model already understood the
//! input and found nothing in it.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::InterpretationError;
use crate::llm_client::strip_json_fences;
use crate::models::requirement::Requirement;
use crate::providers::LanguageModel;
use crate::recommendation::prompts::{EXTRACT_PROMPT_TEMPLATE, EXTRACT_SYSTEM};

const MAX_ATTEMPTS: u32 = 3;

/// Raw extraction shape as returned by the model, before normalization.
#[derive(Debug, Deserialize)]
struct RequirementExtraction {
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    optional_skills: Vec<String>,
    #[serde(default)]
    min_experience_years: Option<f64>,
    #[serde(default)]
    education_level: Option<String>,
    #[serde(default)]
    free_text_residual: String,
}

/// Interprets `raw_text` into an immutable `Requirement`.
pub async fn interpret(
    llm: &dyn LanguageModel,
    raw_text: &str,
) -> Result<Requirement, InterpretationError> {
    let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{requirement_text}", raw_text);

    let mut last_error: Option<InterpretationError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            warn!("Requirement extraction attempt {attempt} failed, retrying...");
        }

        let text = match llm.complete(&prompt, EXTRACT_SYSTEM).await {
            Ok(text) => text,
            Err(e) if e.is_transient() => {
                last_error = Some(InterpretationError::Provider(e));
                continue;
            }
            Err(e) => return Err(InterpretationError::Provider(e)),
        };

        match serde_json::from_str::<RequirementExtraction>(strip_json_fences(&text)) {
            Ok(extraction) => {
                let requirement = build_requirement(raw_text, extraction);
                if requirement.is_empty() {
                    return Err(InterpretationError::EmptyRequirement);
                }
                debug!(
                    "Interpreted requirement: {} required / {} optional skills",
                    requirement.required_skills.len(),
                    requirement.optional_skills.len()
                );
                return Ok(requirement);
            }
            Err(e) => {
                // Malformed structured output: re-ask within the attempt budget.
                last_error = Some(InterpretationError::Malformed(e.to_string()));
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| InterpretationError::Malformed("no attempts made".to_string())))
}

/// Normalizes the raw extraction: skills lowercased and deduplicated, blank
/// entries dropped, unknown education levels coerced to None.
fn build_requirement(raw_text: &str, extraction: RequirementExtraction) -> Requirement {
    let normalize = |skills: Vec<String>| {
        skills
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    };

    Requirement {
        raw_text: raw_text.to_string(),
        required_skills: normalize(extraction.required_skills),
        optional_skills: normalize(extraction.optional_skills),
        min_experience_years: extraction.min_experience_years.filter(|y| *y >= 0.0),
        education_level: extraction
            .education_level
            .as_deref()
            .and_then(|s| s.parse().ok()),
        free_text_residual: extraction.free_text_residual.trim().to_string(),
    }
}
