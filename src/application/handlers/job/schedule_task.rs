//! ScheduleTaskHandler - manual planning of a single task.
//!
//! A task that was planned before is rescheduled, so its delay against the
//! original plan is tracked.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, JobId, MachineId, Timestamp,
};
use crate::domain::job::Job;
use crate::ports::{Clock, EventPublisher, JobRepository};

use super::publish_job_events;

#[derive(Debug, Clone)]
pub struct ScheduleTaskCommand {
    pub job_id: JobId,
    pub sequence_in_job: u32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub machine_id: Option<MachineId>,
}

pub struct ScheduleTaskHandler {
    job_repository: Arc<dyn JobRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ScheduleTaskHandler {
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
        cmd: ScheduleTaskCommand,
        metadata: CommandMetadata,
    ) -> Result<Job, DomainError> {
        let now = self.clock.now();
        let mut job = self.job_repository.load_job(&cmd.job_id).await?;
        let previously_planned = job
            .task(cmd.sequence_in_job)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TaskNotFound,
                    format!("Job has no task with sequence {}", cmd.sequence_in_job),
                )
                .with_detail("sequence_in_job", cmd.sequence_in_job.to_string())
            })?
            .original_planned_start()
            .is_some();

        if previously_planned {
            job.reschedule_task(cmd.sequence_in_job, cmd.start, cmd.end, cmd.machine_id, now)?;
        } else {
            job.schedule_task(cmd.sequence_in_job, cmd.start, cmd.end, cmd.machine_id, now)?;
        }

        let events = job.take_events();
        let job = self.job_repository.save_job(job).await?;
        publish_job_events(self.event_publisher.as_ref(), events, &metadata).await?;

        tracing::debug!(
            job_id = %job.id(),
            sequence = cmd.sequence_in_job,
            rescheduled = previously_planned,
            "task planned"
        );
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::job::test_support::{new_job, routing, ts, Fixture};
    use crate::application::handlers::job::{CreateJobCommand, CreateJobHandler};

    async fn seeded(fx: &Fixture, machine: MachineId) -> Job {
        CreateJobHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone())
            .handle(
                CreateJobCommand {
                    job: new_job("J-200"),
                    tasks: routing(machine, &[10, 20]),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap()
    }

    fn command(job_id: JobId, machine: MachineId, start: &str, end: &str) -> ScheduleTaskCommand {
        ScheduleTaskCommand {
            job_id,
            sequence_in_job: 10,
            start: ts(start),
            end: ts(end),
            machine_id: Some(machine),
        }
    }

    #[tokio::test]
    async fn first_plan_schedules_then_second_reschedules() {
        let fx = Fixture::new();
        let machine = MachineId::new();
        let job = seeded(&fx, machine).await;
        let handler = ScheduleTaskHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone());

        handler
            .handle(
                command(job.id(), machine, "2024-01-15T08:00:00Z", "2024-01-15T09:15:00Z"),
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();
        let job = handler
            .handle(
                command(job.id(), machine, "2024-01-15T10:00:00Z", "2024-01-15T11:15:00Z"),
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();

        assert_eq!(job.task(10).unwrap().delay_minutes(), 120);
        assert_eq!(job.version(), 3);
        assert!(fx.bus.has_event("job.task_scheduled.v1"));
        assert!(fx.bus.has_event("job.task_rescheduled.v1"));
    }

    #[tokio::test]
    async fn unknown_sequence_is_task_not_found() {
        let fx = Fixture::new();
        let machine = MachineId::new();
        let job = seeded(&fx, machine).await;
        let handler = ScheduleTaskHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone());

        let mut cmd = command(job.id(), machine, "2024-01-15T08:00:00Z", "2024-01-15T09:00:00Z");
        cmd.sequence_in_job = 99;
        let err = handler
            .handle(cmd, CommandMetadata::test_fixture())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[tokio::test]
    async fn inverted_window_is_rejected_and_nothing_saved() {
        let fx = Fixture::new();
        let machine = MachineId::new();
        let job = seeded(&fx, machine).await;
        let handler = ScheduleTaskHandler::new(fx.repo.clone(), fx.bus.clone(), fx.clock.clone());

        assert!(handler
            .handle(
                command(job.id(), machine, "2024-01-15T10:00:00Z", "2024-01-15T09:00:00Z"),
                CommandMetadata::test_fixture(),
            )
            .await
            .is_err());
        assert_eq!(fx.repo.load_job(&job.id()).await.unwrap().version(), 1);
    }
}
