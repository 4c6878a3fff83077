// All LLM prompt constants for the recommendation module.
// Extraction and refinement enforce JSON-only output; reasoning is prose.

/// System prompt for requirement extraction — enforces JSON-only output.
pub const EXTRACT_SYSTEM: &str =
    "You are the intake analyst for a candidate recommendation system. \
    Extract a structured hiring requirement from free text. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Requirement extraction prompt template. Replace `{requirement_text}` before sending.
pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract a structured hiring requirement from the text below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "required_skills": ["python", "backend"],
  "optional_skills": ["kubernetes"],
  "min_experience_years": 5,
  "education_level": "bachelor",
  "free_text_residual": "backend engineer for a payments team"
}

Rules:
- required_skills: skills the text treats as mandatory ("required", "must have", "5+ years of X"). Lowercase, singular terms.
- optional_skills: nice-to-haves ("preferred", "a plus", "bonus"). Lowercase.
- min_experience_years: the minimum years demanded, as a number, or null if the text names none.
- education_level: one of "associate", "bachelor", "master", "doctorate", or null if the text names none.
- free_text_residual: everything meaningful that did not fit the fields above — role phrasing, team, domain. Empty string if nothing remains.

REQUIREMENT TEXT:
{requirement_text}"#;

/// System prompt for requirement refinement — enforces JSON-only output.
pub const REFINE_SYSTEM: &str =
    "You are the intake assistant for a candidate recommendation system. \
    Judge whether the accumulated hiring requirement covers enough aspects \
    (role or responsibilities, skills, experience, education, personal traits — \
    two or three of these suffice) to search on. \
    If it does, rewrite it as one fluent requirement sentence or short paragraph. \
    If it does not, ask for everything still missing in a single concise question. \
    You MUST respond with valid JSON only. \
    Do NOT use markdown code fences.";

/// Refinement prompt template. Replace `{query_history}` and `{latest_response}`.
pub const REFINE_PROMPT_TEMPLATE: &str = r#"Conversation so far (earlier user inputs, oldest first):
{query_history}

Latest user input:
{latest_response}

Return a JSON object with this EXACT schema:
{
  "status": "ready",
  "content": "..."
}

- status: "ready" when the requirement is specific enough to search on, otherwise "need_more_info".
- content: when ready, the refined requirement as natural prose; otherwise one consolidated clarifying question covering every missing aspect."#;

/// System prompt for per-candidate reasoning generation.
pub const REASONING_SYSTEM: &str =
    "You write recommendation justifications for an internal hiring tool. \
    Explain objectively why a candidate fits the stated requirement. \
    Respond with 2-4 plain sentences, no lists, no headings. \
    Focus on the concrete skills and experience that match. \
    Never use the candidate's name or gendered pronouns. \
    Scores are relative signals only — do not quote raw numbers back.";

/// Reasoning prompt template. Replace `{requirement_text}`, `{profile_json}`
/// and `{scores_json}` before sending.
pub const REASONING_PROMPT_TEMPLATE: &str = r#"HIRING REQUIREMENT:
{requirement_text}

CANDIDATE PROFILE:
{profile_json}

RELEVANCE SCORES (each dimension 0-1):
{scores_json}

Write a concise justification for recommending this candidate for the requirement."#;
