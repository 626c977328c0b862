//! StartTaskHandler - records that work on a task has begun.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, JobId, Timestamp};
use crate::domain::job::Job;
use crate::ports::{Clock, EventPublisher, JobRepository};

use super::publish_job_events;

#[derive(Debug, Clone)]
pub struct StartTaskCommand {
    pub job_id: JobId,
    pub sequence_in_job: u32,
    /// Defaults to the clock's current time.
    pub started_at: Option<Timestamp>,
}

pub struct StartTaskHandler {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl StartTaskHandler {
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
        cmd: StartTaskCommand,
        metadata: CommandMetadata,
    ) -> Result<Job, DomainError> {
        let now = self.clock.now();
        let mut job = self.job_repository.load_job(&cmd.job_id).await?;
        job.start_task(cmd.sequence_in_job, cmd.started_at.unwrap_or(now), now)?;

        let events = job.take_events();
        let job = self.job_repository.save_job(job).await?;
        publish_job_events(self.event_publisher.as_ref(), events, &metadata).await?;
        Ok(job)
    }
}
