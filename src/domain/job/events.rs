//! Job domain events.
//!
//! One `JobEvent` is recorded per successful mutation of the aggregate and
//! drained by application handlers through `Job::take_events`.

use serde::{Deserialize, Serialize};

use super::AssignmentType;
use crate::domain::foundation::{
    DomainEvent, EventId, JobId, JobStatus, MachineId, OperatorId, Percentage, PriorityLevel,
    TaskId, Timestamp,
};

/// What happened to the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEventKind {
    Created {
        job_number: String,
        priority: PriorityLevel,
        due_date: Timestamp,
    },
    TaskAdded {
        task_id: TaskId,
        sequence_in_job: u32,
    },
    TaskScheduled {
        task_id: TaskId,
        sequence_in_job: u32,
        start: Timestamp,
        end: Timestamp,
        machine_id: Option<MachineId>,
    },
    TaskRescheduled {
        task_id: TaskId,
        sequence_in_job: u32,
        start: Timestamp,
        end: Timestamp,
        delay_minutes: i64,
    },
    TaskStarted {
        task_id: TaskId,
        sequence_in_job: u32,
        started_at: Timestamp,
    },
    TaskCompleted {
        task_id: TaskId,
        sequence_in_job: u32,
        completed_at: Timestamp,
        completion_percentage: Percentage,
    },
    TaskFailed {
        task_id: TaskId,
        sequence_in_job: u32,
        reason: String,
    },
    TaskReworked {
        task_id: TaskId,
        sequence_in_job: u32,
        rework_count: u32,
    },
    TaskCancelled {
        task_id: TaskId,
        sequence_in_job: u32,
    },
    OperatorAssigned {
        task_id: TaskId,
        operator_id: OperatorId,
        assignment_type: AssignmentType,
    },
    AssignmentStarted {
        task_id: TaskId,
        operator_id: OperatorId,
        started_at: Timestamp,
    },
    AssignmentCompleted {
        task_id: TaskId,
        operator_id: OperatorId,
        completed_at: Timestamp,
    },
    StatusChanged {
        from: JobStatus,
        to: JobStatus,
    },
    PutOnHold {
        previous_status: JobStatus,
        reason: String,
    },
    ReleasedFromHold {
        reason: String,
    },
    PriorityAdjusted {
        from: PriorityLevel,
        to: PriorityLevel,
    },
    ScheduleUpdated {
        planned_start: Timestamp,
        planned_end: Timestamp,
    },
    CriticalPathUpdated {
        critical_task_ids: Vec<TaskId>,
    },
}

impl JobEventKind {
    /// Versioned routing key for the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            JobEventKind::Created { .. } => "job.created.v1",
            JobEventKind::TaskAdded { .. } => "job.task_added.v1",
            JobEventKind::TaskScheduled { .. } => "job.task_scheduled.v1",
            JobEventKind::TaskRescheduled { .. } => "job.task_rescheduled.v1",
            JobEventKind::TaskStarted { .. } => "job.task_started.v1",
            JobEventKind::TaskCompleted { .. } => "job.task_completed.v1",
            JobEventKind::TaskFailed { .. } => "job.task_failed.v1",
            JobEventKind::TaskReworked { .. } => "job.task_reworked.v1",
            JobEventKind::TaskCancelled { .. } => "job.task_cancelled.v1",
            JobEventKind::OperatorAssigned { .. } => "job.operator_assigned.v1",
            JobEventKind::AssignmentStarted { .. } => "job.assignment_started.v1",
            JobEventKind::AssignmentCompleted { .. } => "job.assignment_completed.v1",
            JobEventKind::StatusChanged { .. } => "job.status_changed.v1",
            JobEventKind::PutOnHold { .. } => "job.put_on_hold.v1",
            JobEventKind::ReleasedFromHold { .. } => "job.released_from_hold.v1",
            JobEventKind::PriorityAdjusted { .. } => "job.priority_adjusted.v1",
            JobEventKind::ScheduleUpdated { .. } => "job.schedule_updated.v1",
            JobEventKind::CriticalPathUpdated { .. } => "job.critical_path_updated.v1",
        }
    }
}

/// An immutable record of one change to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub event_id: EventId,
    pub job_id: JobId,
    pub occurred_at: Timestamp,
    #[serde(flatten)]
    pub kind: JobEventKind,
}

impl JobEvent {
    pub fn new(job_id: JobId, occurred_at: Timestamp, kind: JobEventKind) -> Self {
        Self {
            event_id: EventId::new(),
            job_id,
            occurred_at,
            kind,
        }
    }
}

impl DomainEvent for JobEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn schema_version(&self) -> u32 {
        1
    }

    fn aggregate_id(&self) -> String {
        self.job_id.to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "Job"
    }

    fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    fn event_id(&self) -> EventId {
        self.event_id.clone()
    }
}
