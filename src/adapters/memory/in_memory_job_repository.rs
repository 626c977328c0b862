//! In-memory Job repository.
//!
//! Stores `JobState` snapshots behind a tokio `RwLock` and enforces the
//! same optimistic version check a database adapter would.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, JobId};
use crate::domain::job::{Job, JobState};
use crate::ports::{JobFilter, JobRepository};

#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<HashMap<JobId, JobState>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs (useful for tests).
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn clear(&self) {
        self.jobs.write().await.clear();
    }
}

fn not_found(id: &JobId) -> DomainError {
    DomainError::new(ErrorCode::JobNotFound, format!("Job {} not found", id))
        .with_detail("job_id", id.to_string())
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn load_job(&self, id: &JobId) -> Result<Job, DomainError> {
        let state = self
            .jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))?;
        Job::reconstitute(state)
    }

    async fn save_job(&self, job: Job) -> Result<Job, DomainError> {
        let mut jobs = self.jobs.write().await;
        let stored_version = jobs.get(&job.id()).map_or(0, |s| s.version);
        if stored_version != job.version() {
            tracing::warn!(
                job_id = %job.id(),
                expected = stored_version,
                actual = job.version(),
                "rejecting stale job write"
            );
            return Err(DomainError::new(
                ErrorCode::ConcurrencyConflict,
                "Job was modified by another writer",
            )
            .with_detail("job_id", job.id().to_string())
            .with_detail("expected_version", stored_version.to_string())
            .with_detail("actual_version", job.version().to_string()));
        }
        if stored_version == 0 {
            if let Some(existing) = jobs
                .values()
                .find(|s| s.job_number == job.job_number() && s.id != job.id())
            {
                tracing::warn!(
                    job_id = %job.id(),
                    existing_job_id = %existing.id,
                    job_number = job.job_number(),
                    "rejecting duplicate job number"
                );
                return Err(DomainError::new(
                    ErrorCode::DuplicateJobNumber,
                    format!("Job number {} is already in use", job.job_number()),
                )
                .with_detail("job_number", job.job_number())
                .with_detail("existing_job_id", existing.id.to_string()));
            }
        }
        let mut saved = job;
        saved.increment_version();
        jobs.insert(saved.id(), saved.to_state());
        Ok(saved)
    }

    async fn find_by_filters(&self, filter: &JobFilter) -> Result<Vec<Job>, DomainError> {
        let states: Vec<JobState> = self.jobs.read().await.values().cloned().collect();
        let mut found = states
            .into_iter()
            .map(Job::reconstitute)
            .collect::<Result<Vec<_>, _>>()?;
        found.retain(|job| filter.matches(job));
        found.sort_by(|a, b| {
            a.due_date()
                .cmp(&b.due_date())
                .then_with(|| a.job_number().cmp(b.job_number()))
        });
        Ok(found)
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), DomainError> {
        let mut jobs = self.jobs.write().await;
        let state = jobs.get(id).cloned().ok_or_else(|| not_found(id))?;
        Job::reconstitute(state)?.ensure_deletable()?;
        jobs.remove(id);
        Ok(())
    }
}
