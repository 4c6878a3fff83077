use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest education level on a fixed ordinal scale.
/// Ordering is load-bearing: `Associate < Bachelor < Master < Doctorate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Associate => "associate",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Doctorate => "doctorate",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "associate" => Ok(EducationLevel::Associate),
            "bachelor" | "bachelors" => Ok(EducationLevel::Bachelor),
            "master" | "masters" => Ok(EducationLevel::Master),
            "doctorate" | "phd" => Ok(EducationLevel::Doctorate),
            other => Err(format!("unknown education level '{other}'")),
        }
    }
}

/// Structured candidate profile as produced by resume ingestion.
/// Read-only to the recommendation pipeline; the embedding lives in the
/// vector index and is referenced by `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub skills: BTreeSet<String>,
    pub experience_years: f64,
    pub education_level: Option<EducationLevel>,
}

/// Raw row shape of the `candidates` table written by the ingestion side.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        CandidateProfile {
            id: row.id,
            skills: row.skills.into_iter().map(|s| s.to_lowercase()).collect(),
            // Unparseable levels degrade to None rather than failing the fetch.
            education_level: row
                .education_level
                .as_deref()
                .and_then(|s| s.parse().ok()),
            experience_years: row.experience_years,
        }
    }
}
