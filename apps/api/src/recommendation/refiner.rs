//! Requirement Refiner — the multi-turn intake loop that runs before
//! interpretation when the caller wants it.
//!
//! Judges whether the accumulated query covers enough hiring aspects to
//! search on. When it does not, the caller gets one consolidated clarifying
//! question; when it does, a fluent refined query ready for the interpreter.
//! Stateless: the caller carries the query history between turns.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::InterpretationError;
use crate::llm_client::strip_json_fences;
use crate::providers::LanguageModel;
use crate::recommendation::prompts::{REFINE_PROMPT_TEMPLATE, REFINE_SYSTEM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementStatus {
    /// The refined query is specific enough to feed the interpreter.
    Ready,
    /// More information is needed; `content` holds the question to ask.
    NeedMoreInfo,
}

/// Outcome of one refinement turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementOutcome {
    pub status: RefinementStatus,
    /// The refined query when ready, otherwise the clarifying question.
    pub content: String,
}

/// Runs one refinement turn over the accumulated query history.
pub async fn refine(
    llm: &dyn LanguageModel,
    query_history: &[String],
    latest_input: &str,
) -> Result<RefinementOutcome, InterpretationError> {
    let history_text = if query_history.is_empty() {
        "(none)".to_string()
    } else {
        query_history.join("\n")
    };

    let prompt = REFINE_PROMPT_TEMPLATE
        .replace("{query_history}", &history_text)
        .replace("{latest_response}", latest_input);

    let text = llm
        .complete(&prompt, REFINE_SYSTEM)
        .await
        .map_err(InterpretationError::Provider)?;

    let outcome: RefinementOutcome = serde_json::from_str(strip_json_fences(&text))
        .map_err(|e| InterpretationError::Malformed(e.to_string()))?;

    if outcome.content.trim().is_empty() {
        return Err(InterpretationError::Malformed(
            "refinement returned empty content".to_string(),
        ));
    }

    match outcome.status {
        RefinementStatus::Ready => info!("Requirement refinement complete, ready to search"),
        RefinementStatus::NeedMoreInfo => info!("Requirement refinement needs another turn"),
    }

    Ok(outcome)
}
