//! Postgres-backed candidate profile store.
//!
//! The `candidates` table is written by the resume ingestion side; this
//! service only ever reads it. Profiles come back keyed by id so the scorer
//! can join them against retrieval hits.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::candidate::{CandidateProfile, CandidateRow};
use crate::providers::{CandidateStore, ProviderError};

pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn fetch_profiles(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, CandidateProfile>, ProviderError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT id, skills, experience_years, education_level, created_at
            FROM candidates
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable {
            provider: "candidate_store",
            message: e.to_string(),
        })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let profile = CandidateProfile::from(row);
                (profile.id, profile)
            })
            .collect())
    }
}
