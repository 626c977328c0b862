//! Job repository port.
//!
//! Persists fully hydrated Job aggregates (job plus all tasks). The domain
//! never issues queries itself; it receives and returns whole aggregates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, JobId, JobStatus, PriorityLevel, Timestamp};
use crate::domain::job::Job;

/// Criteria for `find_by_filters`. Empty criteria match every job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub statuses: Vec<JobStatus>,
    pub min_priority: Option<PriorityLevel>,
    pub due_before: Option<Timestamp>,
    pub customer_name: Option<String>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_min_priority(mut self, priority: PriorityLevel) -> Self {
        self.min_priority = Some(priority);
        self
    }

    pub fn due_before(mut self, at: Timestamp) -> Self {
        self.due_before = Some(at);
        self
    }

    pub fn for_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Jobs that are neither terminal nor on hold.
    pub fn active() -> Self {
        Self::new()
            .with_status(JobStatus::Planned)
            .with_status(JobStatus::Released)
            .with_status(JobStatus::InProgress)
    }

    pub fn matches(&self, job: &Job) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&job.status()))
            && self.min_priority.map_or(true, |p| job.priority() >= p)
            && self.due_before.map_or(true, |d| job.due_date() < d)
            && self
                .customer_name
                .as_deref()
                .map_or(true, |c| job.customer_name().eq_ignore_ascii_case(c))
    }
}

/// Repository port for Job aggregate persistence.
///
/// Implementations must enforce optimistic concurrency: a save whose
/// `version` does not match the stored version is rejected with
/// `ConcurrencyConflict` and nothing is written. Job numbers are unique
/// across stored jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Loads a job with all of its tasks.
    ///
    /// # Errors
    ///
    /// - `JobNotFound` if no job has this id
    async fn load_job(&self, id: &JobId) -> Result<Job, DomainError>;

    /// Atomically stores the job and returns it with its version incremented.
    ///
    /// Pending domain events are not persisted; take them before saving.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if the stored version differs from `job.version()`
    /// - `DuplicateJobNumber` on first save when another job already holds
    ///   the same sanitized job number
    async fn save_job(&self, job: Job) -> Result<Job, DomainError>;

    /// All jobs matching the filter, ordered by due date then job number.
    async fn find_by_filters(&self, filter: &JobFilter) -> Result<Vec<Job>, DomainError>;

    /// Removes a job that has not reached production.
    ///
    /// # Errors
    ///
    /// - `JobNotFound` if no job has this id
    /// - `BusinessRuleViolation` if the job is in production
    async fn delete_job(&self, id: &JobId) -> Result<(), DomainError>;
}
