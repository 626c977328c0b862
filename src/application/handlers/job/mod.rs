//! Job command handlers.
//!
//! Every handler follows the same shape: read `now` from the clock, load
//! the aggregate, run one domain operation, drain its events, save, then
//! publish. Nothing is published when the save fails.

mod change_job_status;
mod complete_task;
mod create_job;
mod schedule_task;
mod solve_schedule;
mod start_task;

pub use change_job_status::{ChangeJobStatusCommand, ChangeJobStatusHandler, JobStatusChange};
pub use complete_task::{CompleteTaskCommand, CompleteTaskHandler, CompleteTaskResult};
pub use create_job::{CreateJobCommand, CreateJobHandler};
pub use schedule_task::{ScheduleTaskCommand, ScheduleTaskHandler};
pub use solve_schedule::{
    SolveScheduleCommand, SolveScheduleError, SolveScheduleHandler, SolveScheduleResult,
    SolveSettings,
};
pub use start_task::{StartTaskCommand, StartTaskHandler};

use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventEnvelope, SerializableDomainEvent,
};
use crate::domain::job::JobEvent;
use crate::ports::EventPublisher;

/// Wraps job events in envelopes stamped with the command context.
pub(crate) fn envelopes_for(
    events: &[JobEvent],
    metadata: &CommandMetadata,
) -> Result<Vec<EventEnvelope>, DomainError> {
    let correlation_id = metadata.correlation_id();
    events
        .iter()
        .map(|event| {
            event
                .to_envelope()
                .map(|envelope| metadata.stamp(envelope, &correlation_id))
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::InternalError,
                        format!("Failed to serialize job event: {}", e),
                    )
                })
        })
        .collect()
}

/// Publishes drained job events in order.
pub(crate) async fn publish_job_events(
    publisher: &dyn EventPublisher,
    events: Vec<JobEvent>,
    metadata: &CommandMetadata,
) -> Result<(), DomainError> {
    if events.is_empty() {
        return Ok(());
    }
    let envelopes = envelopes_for(&events, metadata)?;
    publisher.publish_all(envelopes).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::adapters::{FixedClock, InMemoryEventBus, InMemoryJobRepository};
    use crate::domain::foundation::{Duration, MachineId, PriorityLevel, Timestamp};
    use crate::domain::job::{NewJob, NewTask};

    pub fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    pub struct Fixture {
        pub repo: Arc<InMemoryJobRepository>,
        pub bus: Arc<InMemoryEventBus>,
        pub clock: Arc<FixedClock>,
    }

    impl Fixture {
        /// Monday 2024-01-15 07:00 UTC.
        pub fn new() -> Self {
            Self {
                repo: Arc::new(InMemoryJobRepository::new()),
                bus: Arc::new(InMemoryEventBus::new()),
                clock: Arc::new(FixedClock::new(ts("2024-01-15T07:00:00Z"))),
            }
        }
    }

    pub fn new_job(number: &str) -> NewJob {
        NewJob {
            job_number: number.to_string(),
            customer_name: "Acme Tooling".to_string(),
            part_number: "BRKT-7".to_string(),
            quantity: 10,
            priority: PriorityLevel::Normal,
            release_date: None,
            due_date: ts("2024-01-19T15:00:00Z"),
        }
    }

    pub fn routing(machine: MachineId, sequences: &[u32]) -> Vec<NewTask> {
        sequences
            .iter()
            .map(|s| {
                NewTask::new(*s)
                    .with_setup(Duration::from_minutes(15).unwrap())
                    .with_machine_option(machine, Duration::from_minutes(60).unwrap())
            })
            .collect()
    }
}
