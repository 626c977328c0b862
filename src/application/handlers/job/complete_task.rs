//! CompleteTaskHandler - records the end of a task.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, DomainError, Duration, JobId, Percentage, Timestamp,
};
use crate::domain::job::Job;
use crate::ports::{Clock, EventPublisher, JobRepository};

use super::publish_job_events;

#[derive(Debug, Clone)]
pub struct CompleteTaskCommand {
    pub job_id: JobId,
    pub sequence_in_job: u32,
    /// Defaults to the clock's current time.
    pub actual_end: Option<Timestamp>,
    pub actual_setup: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CompleteTaskResult {
    pub job: Job,
    pub completion_percentage: Percentage,
    /// True once every task is completed or cancelled; the job itself is
    /// closed by an explicit status change.
    pub all_tasks_finished: bool,
}

pub struct CompleteTaskHandler {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl CompleteTaskHandler {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            job_repository,
            event_publisher,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteTaskCommand,
        metadata: CommandMetadata,
    ) -> Result<CompleteTaskResult, DomainError> {
        let now = self.clock.now();
        let mut job = self.job_repository.load_job(&cmd.job_id).await?;
        job.complete_task(
            cmd.sequence_in_job,
            cmd.actual_end.unwrap_or(now),
            cmd.actual_setup,
            now,
        )?;

        let events = job.take_events();
        let job = self.job_repository.save_job(job).await?;
        publish_job_events(self.event_publisher.as_ref(), events, &metadata).await?;

        let completion_percentage = job.completion_percentage();
        let all_tasks_finished = job.tasks().iter().all(|t| t.status().is_finished());
        tracing::info!(
            job_id = %job.id(),
            sequence = cmd.sequence_in_job,
            completion = %completion_percentage,
            "task completed"
        );
        Ok(CompleteTaskResult {
            job,
            completion_percentage,
            all_tasks_finished,
        })
    }
}
