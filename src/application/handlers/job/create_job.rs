//! CreateJobHandler - creates a job together with its routing.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError};
use crate::domain::job::{Job, NewJob, NewTask};
use crate::ports::{Clock, EventPublisher, JobRepository};

use super::publish_job_events;

/// Command to create a job and its tasks in one step.
#[derive(Debug, Clone)]
pub struct CreateJobCommand {
    pub job: NewJob,
    /// Routing steps; order does not matter, tasks are kept sorted by sequence.
    pub tasks: Vec<NewTask>,
}

pub struct CreateJobHandler {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl CreateJobHandler {
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
        cmd: CreateJobCommand,
        metadata: CommandMetadata,
    ) -> Result<Job, DomainError> {
        let now = self.clock.now();
        let mut job = Job::create(cmd.job, now)?;
        for task in cmd.tasks {
            job.add_task(task, now)?;
        }

        let events = job.take_events();
        let job = self.job_repository.save_job(job).await?;
        publish_job_events(self.event_publisher.as_ref(), events, &metadata).await?;

        tracing::info!(
            job_id = %job.id(),
            job_number = job.job_number(),
            tasks = job.tasks().len(),
            "job created"
        );
        Ok(job)
    }
}
