//! ChangeJobStatusHandler - lifecycle changes of a whole job.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, JobId, JobStatus, PriorityLevel};
use crate::domain::job::Job;
use crate::ports::{Clock, EventPublisher, JobRepository};

use super::publish_job_events;

/// The lifecycle change to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatusChange {
    /// A plain move along the status table (release, cancel, complete).
    To(JobStatus),
    PutOnHold { reason: String },
    ReleaseFromHold { reason: String },
    AdjustPriority(PriorityLevel),
}

#[derive(Debug, Clone)]
pub struct ChangeJobStatusCommand {
    pub job_id: JobId,
    pub change: JobStatusChange,
}

pub struct ChangeJobStatusHandler {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ChangeJobStatusHandler {
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
        cmd: ChangeJobStatusCommand,
        metadata: CommandMetadata,
    ) -> Result<Job, DomainError> {
        let now = self.clock.now();
        let mut job = self.job_repository.load_job(&cmd.job_id).await?;
        let from = job.status();

        match cmd.change {
            JobStatusChange::To(target) => job.change_status(target, now)?,
            JobStatusChange::PutOnHold { reason } => job.put_on_hold(reason, now)?,
            JobStatusChange::ReleaseFromHold { reason } => job.release_from_hold(reason, now)?,
            JobStatusChange::AdjustPriority(priority) => job.adjust_priority(priority, now)?,
        }

        let events = job.take_events();
        if events.is_empty() {
            return Ok(job);
        }
        let job = self.job_repository.save_job(job).await?;
        publish_job_events(self.event_publisher.as_ref(), events, &metadata).await?;

        tracing::info!(
            job_id = %job.id(),
            from = %from,
            to = %job.status(),
            "job lifecycle changed"
        );
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::job::test_support::{new_job, routing, Fixture};
    use crate::application::handlers::job::{CreateJobCommand, CreateJobHandler};
    use crate::domain::foundation::{MachineId, TaskStatus};

    async fn seeded(fx: &Fixture) -> Job {
        CreateJobHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone())
            .handle(
                CreateJobCommand {
                    job: new_job("J-500"),
                    tasks: routing(MachineId::new(), &[10, 20]),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap()
    }

    fn handler(fx: &Fixture) -> ChangeJobStatusHandler {
        ChangeJobStatusHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone())
    }

    async fn apply(fx: &Fixture, job_id: JobId, change: JobStatusChange) -> Result<Job, DomainError> {
        handler(fx)
            .handle(ChangeJobStatusCommand { job_id, change }, CommandMetadata::test_fixture())
            .await
    }

    #[tokio::test]
    async fn hold_and_release_round_trip() {
        let fx = Fixture::new();
        let job = seeded(&fx).await;

        let held = apply(
            &fx,
            job.id(),
            JobStatusChange::PutOnHold {
                reason: "material shortage".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(held.status(), JobStatus::OnHold);
        assert_eq!(held.hold_reason(), Some("material shortage"));

        let released = apply(
            &fx,
            job.id(),
            JobStatusChange::ReleaseFromHold {
                reason: "material arrived".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(released.status(), JobStatus::Released);
        assert_eq!(released.hold_reason(), None);
        assert_eq!(released.task(10).unwrap().status(), TaskStatus::Ready);
        assert!(fx.bus.has_event("job.put_on_hold.v1"));
        assert!(fx.bus.has_event("job.released_from_hold.v1"));
    }

    #[tokio::test]
    async fn cancelling_cancels_open_tasks() {
        let fx = Fixture::new();
        let job = seeded(&fx).await;

        let cancelled = apply(&fx, job.id(), JobStatusChange::To(JobStatus::Cancelled))
            .await
            .unwrap();
        assert!(cancelled
            .tasks()
            .iter()
            .all(|t| t.status() == TaskStatus::Cancelled));
        assert_eq!(fx.bus.events_of_type("job.task_cancelled.v1").len(), 2);
    }

    #[tokio::test]
    async fn completing_with_open_tasks_is_a_rule_violation() {
        let fx = Fixture::new();
        let job = seeded(&fx).await;
        apply(&fx, job.id(), JobStatusChange::To(JobStatus::Released))
            .await
            .unwrap();

        let err = apply(&fx, job.id(), JobStatusChange::To(JobStatus::Completed))
            .await
            .unwrap_err();
        assert!(err.is_business_rule_violation());
        assert_eq!(err.detail("rule"), Some("incomplete_tasks"));
    }

    #[tokio::test]
    async fn unchanged_priority_is_not_saved() {
        let fx = Fixture::new();
        let job = seeded(&fx).await;
        let events_before = fx.bus.event_count();

        let same = apply(
            &fx,
            job.id(),
            JobStatusChange::AdjustPriority(job.priority()),
        )
        .await
        .unwrap();
        assert_eq!(same.version(), job.version());
        assert_eq!(fx.bus.event_count(), events_before);

        let raised = apply(
            &fx,
            job.id(),
            JobStatusChange::AdjustPriority(PriorityLevel::Critical),
        )
        .await
        .unwrap();
        assert_eq!(raised.priority(), PriorityLevel::Critical);
        assert!(fx.bus.has_event("job.priority_adjusted.v1"));
    }
}
