use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::candidate::EducationLevel;

/// Structured hiring requirement derived from free text.
/// Immutable once built — every later pipeline stage borrows it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub raw_text: String,
    pub required_skills: BTreeSet<String>,
    pub optional_skills: BTreeSet<String>,
    pub min_experience_years: Option<f64>,
    pub education_level: Option<EducationLevel>,
    /// Whatever the extraction could not place into a structured field.
    pub free_text_residual: String,
}

impl Requirement {
    /// True when the extraction carried no usable signal at all.
    pub fn is_empty(&self) -> bool {
        self.required_skills.is_empty()
            && self.optional_skills.is_empty()
            && self.free_text_residual.trim().is_empty()
    }
}
