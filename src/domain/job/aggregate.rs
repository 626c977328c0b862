//! Job aggregate - the root entity for production scheduling.
//!
//! A Job owns its ordered tasks. External code never reaches into a task;
//! every change goes through a Job method, which re-checks all invariants
//! afterwards and restores the previous state if any of them fail.

use serde::{Deserialize, Serialize};

use super::{
    JobEvent, JobEventKind, NewTask, OperatorAssignment, Task, MAX_SEQUENCE,
};
use crate::domain::foundation::{
    DomainError, Duration, ErrorCode, JobId, JobStatus, MachineId, OperatorId, Percentage,
    PriorityLevel, StateMachine, TaskId, TaskStatus, Timestamp, ValidationError,
};

/// Input for `Job::create`.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_number: String,
    pub customer_name: String,
    pub part_number: String,
    pub quantity: u32,
    pub priority: PriorityLevel,
    pub release_date: Option<Timestamp>,
    pub due_date: Timestamp,
}

/// Persistence shape of a job, used by repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pub id: JobId,
    pub job_number: String,
    pub customer_name: String,
    pub part_number: String,
    pub quantity: u32,
    pub priority: PriorityLevel,
    pub status: JobStatus,
    pub release_date: Option<Timestamp>,
    pub due_date: Timestamp,
    pub planned_start: Option<Timestamp>,
    pub planned_end: Option<Timestamp>,
    pub actual_start: Option<Timestamp>,
    pub actual_end: Option<Timestamp>,
    pub current_operation_sequence: u32,
    pub hold_reason: Option<String>,
    pub tasks: Vec<Task>,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The Job aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    job_number: String,
    customer_name: String,
    part_number: String,
    quantity: u32,
    priority: PriorityLevel,
    status: JobStatus,
    release_date: Option<Timestamp>,
    due_date: Timestamp,
    planned_start: Option<Timestamp>,
    planned_end: Option<Timestamp>,
    actual_start: Option<Timestamp>,
    actual_end: Option<Timestamp>,
    /// Highest sequence completed so far (0 before the first completion).
    current_operation_sequence: u32,
    hold_reason: Option<String>,
    /// Always sorted by `sequence_in_job`.
    tasks: Vec<Task>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    domain_events: Vec<JobEvent>,
}

impl Job {
    /// Creates a new job in PLANNED status.
    ///
    /// The due date must be strictly after `now`.
    pub fn create(new_job: NewJob, now: Timestamp) -> Result<Self, DomainError> {
        let job_number = sanitize_job_number(&new_job.job_number)?;
        let customer_name = required_text("customer_name", &new_job.customer_name)?;
        let part_number = required_text("part_number", &new_job.part_number)?;
        if new_job.quantity == 0 {
            return Err(
                ValidationError::out_of_range("quantity", 1, i64::from(u32::MAX), 0).into(),
            );
        }
        if new_job.due_date <= now {
            return Err(ValidationError::not_in_future("due_date", new_job.due_date).into());
        }
        if let Some(release) = new_job.release_date {
            if release >= new_job.due_date {
                return Err(DomainError::validation(
                    "release_date",
                    "Release date must be before the due date",
                )
                .with_detail("value", release.to_string()));
            }
        }

        let id = JobId::new();
        let mut job = Self {
            id,
            job_number: job_number.clone(),
            customer_name,
            part_number,
            quantity: new_job.quantity,
            priority: new_job.priority,
            status: JobStatus::Planned,
            release_date: new_job.release_date,
            due_date: new_job.due_date,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            current_operation_sequence: 0,
            hold_reason: None,
            tasks: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            domain_events: Vec::new(),
        };
        job.record_event(
            now,
            JobEventKind::Created {
                job_number,
                priority: new_job.priority,
                due_date: new_job.due_date,
            },
        );
        Ok(job)
    }

    /// Rebuilds a job from persisted state without recording events.
    pub fn reconstitute(state: JobState) -> Result<Self, DomainError> {
        let mut tasks = state.tasks;
        tasks.sort_by_key(Task::sequence_in_job);
        let job = Self {
            id: state.id,
            job_number: state.job_number,
            customer_name: state.customer_name,
            part_number: state.part_number,
            quantity: state.quantity,
            priority: state.priority,
            status: state.status,
            release_date: state.release_date,
            due_date: state.due_date,
            planned_start: state.planned_start,
            planned_end: state.planned_end,
            actual_start: state.actual_start,
            actual_end: state.actual_end,
            current_operation_sequence: state.current_operation_sequence,
            hold_reason: state.hold_reason,
            tasks,
            version: state.version,
            created_at: state.created_at,
            updated_at: state.updated_at,
            domain_events: Vec::new(),
        };
        job.check_invariants()?;
        Ok(job)
    }

    /// Snapshot of the persisted fields.
    pub fn to_state(&self) -> JobState {
        JobState {
            id: self.id,
            job_number: self.job_number.clone(),
            customer_name: self.customer_name.clone(),
            part_number: self.part_number.clone(),
            quantity: self.quantity,
            priority: self.priority,
            status: self.status,
            release_date: self.release_date,
            due_date: self.due_date,
            planned_start: self.planned_start,
            planned_end: self.planned_end,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            current_operation_sequence: self.current_operation_sequence,
            hold_reason: self.hold_reason.clone(),
            tasks: self.tasks.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn job_number(&self) -> &str {
        &self.job_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn priority(&self) -> PriorityLevel {
        self.priority
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn release_date(&self) -> Option<Timestamp> {
        self.release_date
    }

    pub fn due_date(&self) -> Timestamp {
        self.due_date
    }

    pub fn planned_start(&self) -> Option<Timestamp> {
        self.planned_start
    }

    pub fn planned_end(&self) -> Option<Timestamp> {
        self.planned_end
    }

    pub fn actual_start(&self) -> Option<Timestamp> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<Timestamp> {
        self.actual_end
    }

    pub fn current_operation_sequence(&self) -> u32 {
        self.current_operation_sequence
    }

    pub fn hold_reason(&self) -> Option<&str> {
        self.hold_reason.as_deref()
    }

    /// Tasks ordered by sequence.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, sequence: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.sequence_in_job() == sequence)
    }

    pub fn task_by_id(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id() == task_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Completed)
            .count()
    }

    /// Completed tasks over all tasks; zero for a job without tasks.
    pub fn completion_percentage(&self) -> Percentage {
        Percentage::of(self.completed_task_count(), self.tasks.len())
    }

    /// Window from release (or creation) to due date.
    pub fn job_window(&self) -> (Timestamp, Timestamp) {
        let start = self
            .planned_start
            .or(self.release_date)
            .unwrap_or(self.created_at);
        (start, self.due_date)
    }

    /// Sum of planned setup time over all tasks.
    pub fn total_planned_setup(&self) -> Duration {
        self.tasks.iter().map(Task::planned_setup).sum()
    }

    /// True if every invariant holds.
    pub fn is_valid(&self) -> bool {
        self.check_invariants().is_ok()
    }

    /// Takes accumulated domain events, clearing the internal buffer.
    pub fn take_events(&mut self) -> Vec<JobEvent> {
        std::mem::take(&mut self.domain_events)
    }

    pub fn pending_events(&self) -> &[JobEvent] {
        &self.domain_events
    }

    /// Called by repositories once a write has been accepted.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    // ───────────────────────────────────────────────────────────────
    // Task operations
    // ───────────────────────────────────────────────────────────────

    /// Adds a task; fails once the job is COMPLETED or CANCELLED.
    pub fn add_task(&mut self, new_task: NewTask, now: Timestamp) -> Result<TaskId, DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("add tasks to")?;
            let sequence = new_task.sequence_in_job;
            if job.task(sequence).is_some() {
                return Err(DomainError::new(
                    ErrorCode::DuplicateSequence,
                    format!("Sequence {} is already used in job {}", sequence, job.job_number),
                )
                .with_detail("sequence_in_job", sequence.to_string()));
            }
            let task = Task::new(job.id, new_task)?;
            let task_id = task.id();
            let index = job
                .tasks
                .partition_point(|t| t.sequence_in_job() < sequence);
            job.tasks.insert(index, task);
            job.record_event(
                now,
                JobEventKind::TaskAdded {
                    task_id,
                    sequence_in_job: sequence,
                },
            );
            Ok(task_id)
        })
    }

    /// Plans a task between `start` and `end`, optionally on a machine.
    pub fn schedule_task(
        &mut self,
        sequence: u32,
        start: Timestamp,
        end: Timestamp,
        machine: Option<MachineId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("schedule tasks of")?;
            let task = job.task_mut(sequence)?;
            task.schedule(start, end, machine)?;
            let kind = JobEventKind::TaskScheduled {
                task_id: task.id(),
                sequence_in_job: sequence,
                start,
                end,
                machine_id: task.assigned_machine_id(),
            };
            job.record_event(now, kind);
            Ok(())
        })
    }

    /// Moves an already planned task and records its delay.
    pub fn reschedule_task(
        &mut self,
        sequence: u32,
        start: Timestamp,
        end: Timestamp,
        machine: Option<MachineId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("reschedule tasks of")?;
            let task = job.task_mut(sequence)?;
            task.reschedule(start, end, machine)?;
            let kind = JobEventKind::TaskRescheduled {
                task_id: task.id(),
                sequence_in_job: sequence,
                start,
                end,
                delay_minutes: task.delay_minutes(),
            };
            job.record_event(now, kind);
            Ok(())
        })
    }

    /// Starts a task once all its predecessors are finished.
    ///
    /// The first task started moves a RELEASED job to IN_PROGRESS.
    pub fn start_task(
        &mut self,
        sequence: u32,
        started_at: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            if !job.status.accepts_work() {
                return Err(job.rule(
                    "job_not_released",
                    format!("Cannot start work on a {} job", job.status),
                ));
            }
            if let Some(blocking) = job
                .tasks
                .iter()
                .find(|t| t.sequence_in_job() < sequence && !t.status().is_finished())
            {
                return Err(job
                    .rule(
                        "precedence",
                        format!(
                            "Task {} cannot start before task {} is finished",
                            sequence,
                            blocking.sequence_in_job()
                        ),
                    )
                    .with_detail("blocking_sequence", blocking.sequence_in_job().to_string()));
            }
            let task = job.task_mut(sequence)?;
            if task.status() == TaskStatus::Pending {
                task.mark_ready()?;
            }
            task.start(started_at)?;
            let task_id = task.id();
            if job.status == JobStatus::Released {
                job.apply_status(JobStatus::InProgress)?;
                job.actual_start = Some(started_at);
            }
            job.record_event(
                now,
                JobEventKind::TaskStarted {
                    task_id,
                    sequence_in_job: sequence,
                    started_at,
                },
            );
            Ok(())
        })
    }

    /// Completes a task, advances the operation pointer and readies the next task.
    pub fn complete_task(
        &mut self,
        sequence: u32,
        actual_end: Timestamp,
        actual_setup: Option<Duration>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            let task = job.task_mut(sequence)?;
            task.complete(actual_end, actual_setup)?;
            let task_id = task.id();
            job.current_operation_sequence = job.current_operation_sequence.max(sequence);
            if let Some(next) = job
                .tasks
                .iter_mut()
                .find(|t| t.sequence_in_job() > sequence && !t.status().is_finished())
            {
                if next.status() == TaskStatus::Pending {
                    next.mark_ready()?;
                }
            }
            let completion_percentage = job.completion_percentage();
            job.record_event(
                now,
                JobEventKind::TaskCompleted {
                    task_id,
                    sequence_in_job: sequence,
                    completed_at: actual_end,
                    completion_percentage,
                },
            );
            Ok(())
        })
    }

    /// Marks an in-progress task as failed.
    pub fn fail_task(
        &mut self,
        sequence: u32,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let reason = required_text("reason", &reason.into())?;
        self.mutate(now, |job| {
            let task = job.task_mut(sequence)?;
            task.fail(reason.clone())?;
            let task_id = task.id();
            job.record_event(
                now,
                JobEventKind::TaskFailed {
                    task_id,
                    sequence_in_job: sequence,
                    reason,
                },
            );
            Ok(())
        })
    }

    /// Returns a failed task to READY for another attempt.
    pub fn rework_task(&mut self, sequence: u32, now: Timestamp) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("rework tasks of")?;
            let task = job.task_mut(sequence)?;
            task.rework()?;
            let kind = JobEventKind::TaskReworked {
                task_id: task.id(),
                sequence_in_job: sequence,
                rework_count: task.rework_count(),
            };
            job.record_event(now, kind);
            Ok(())
        })
    }

    pub fn cancel_task(&mut self, sequence: u32, now: Timestamp) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            let task = job.task_mut(sequence)?;
            task.cancel()?;
            let task_id = task.id();
            job.record_event(
                now,
                JobEventKind::TaskCancelled {
                    task_id,
                    sequence_in_job: sequence,
                },
            );
            Ok(())
        })
    }

    pub fn assign_operator(
        &mut self,
        sequence: u32,
        assignment: OperatorAssignment,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("assign operators to")?;
            let operator_id = assignment.operator_id();
            let assignment_type = assignment.assignment_type();
            let task = job.task_mut(sequence)?;
            task.assign_operator(assignment)?;
            let task_id = task.id();
            job.record_event(
                now,
                JobEventKind::OperatorAssigned {
                    task_id,
                    operator_id,
                    assignment_type,
                },
            );
            Ok(())
        })
    }

    pub fn start_assignment(
        &mut self,
        sequence: u32,
        operator_id: OperatorId,
        started_at: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            let task = job.task_mut(sequence)?;
            task.start_assignment(&operator_id, started_at)?;
            let task_id = task.id();
            job.record_event(
                now,
                JobEventKind::AssignmentStarted {
                    task_id,
                    operator_id,
                    started_at,
                },
            );
            Ok(())
        })
    }

    pub fn complete_assignment(
        &mut self,
        sequence: u32,
        operator_id: OperatorId,
        completed_at: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            let task = job.task_mut(sequence)?;
            task.complete_assignment(&operator_id, completed_at)?;
            let task_id = task.id();
            job.record_event(
                now,
                JobEventKind::AssignmentCompleted {
                    task_id,
                    operator_id,
                    completed_at,
                },
            );
            Ok(())
        })
    }

    /// Flags exactly the given tasks as critical. Records an event only on change.
    pub fn apply_critical_path(
        &mut self,
        critical: &[TaskId],
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.mutate(now, |job| {
            let mut changed = false;
            for task in &mut job.tasks {
                let flag = critical.contains(&task.id());
                if task.is_critical_path() != flag {
                    task.set_critical_path(flag);
                    changed = true;
                }
            }
            if changed {
                let critical_task_ids = job
                    .tasks
                    .iter()
                    .filter(|t| t.is_critical_path())
                    .map(Task::id)
                    .collect();
                job.record_event(now, JobEventKind::CriticalPathUpdated { critical_task_ids });
            }
            Ok(changed)
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Job lifecycle
    // ───────────────────────────────────────────────────────────────

    /// Moves the job along its status table.
    ///
    /// COMPLETED requires every task to be completed or cancelled;
    /// CANCELLED cancels every unfinished task.
    pub fn change_status(&mut self, target: JobStatus, now: Timestamp) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            if target == JobStatus::Completed {
                if let Some(open) = job.tasks.iter().find(|t| !t.status().is_finished()) {
                    return Err(job
                        .rule(
                            "incomplete_tasks",
                            format!(
                                "Cannot complete job while task {} is {}",
                                open.sequence_in_job(),
                                open.status()
                            ),
                        )
                        .with_detail("blocking_sequence", open.sequence_in_job().to_string()));
                }
            }
            let from = job.status;
            job.apply_status(target)?;
            if from == JobStatus::OnHold {
                job.hold_reason = None;
            }
            match target {
                JobStatus::Completed => job.actual_end = Some(now),
                JobStatus::Cancelled => job.cancel_open_tasks(now)?,
                JobStatus::Released => job.ready_first_open_task()?,
                _ => {}
            }
            job.record_event(now, JobEventKind::StatusChanged { from, to: target });
            Ok(())
        })
    }

    /// Puts the job on hold, recording why.
    pub fn put_on_hold(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        let reason = required_text("reason", &reason.into())?;
        self.mutate(now, |job| {
            let previous_status = job.status;
            job.apply_status(JobStatus::OnHold)?;
            job.hold_reason = Some(reason.clone());
            job.record_event(
                now,
                JobEventKind::PutOnHold {
                    previous_status,
                    reason,
                },
            );
            Ok(())
        })
    }

    /// Releases a held job back to RELEASED.
    pub fn release_from_hold(
        &mut self,
        reason: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let reason = required_text("reason", &reason.into())?;
        self.mutate(now, |job| {
            if job.status != JobStatus::OnHold {
                return Err(job.rule(
                    "not_on_hold",
                    format!("Job is {} and not on hold", job.status),
                ));
            }
            job.apply_status(JobStatus::Released)?;
            job.hold_reason = None;
            job.ready_first_open_task()?;
            job.record_event(now, JobEventKind::ReleasedFromHold { reason });
            Ok(())
        })
    }

    pub fn adjust_priority(&mut self, priority: PriorityLevel, now: Timestamp) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("change the priority of")?;
            let from = job.priority;
            if from == priority {
                return Ok(());
            }
            job.priority = priority;
            job.record_event(now, JobEventKind::PriorityAdjusted { from, to: priority });
            Ok(())
        })
    }

    /// Sets the job's planned start and end.
    pub fn update_schedule(
        &mut self,
        planned_start: Timestamp,
        planned_end: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.mutate(now, |job| {
            job.ensure_not_terminal("reschedule")?;
            if planned_start >= planned_end {
                return Err(job
                    .rule("schedule_window", "Planned end must be after planned start")
                    .with_detail("start", planned_start.to_string())
                    .with_detail("end", planned_end.to_string()));
            }
            job.planned_start = Some(planned_start);
            job.planned_end = Some(planned_end);
            job.record_event(
                now,
                JobEventKind::ScheduleUpdated {
                    planned_start,
                    planned_end,
                },
            );
            Ok(())
        })
    }

    /// Deletion is only allowed before the job reaches production.
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.status.is_in_production() || self.actual_start.is_some() {
            return Err(self.rule(
                "job_in_production",
                "Jobs that have reached production cannot be deleted",
            ));
        }
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Invariants
    // ───────────────────────────────────────────────────────────────

    /// Checks every aggregate invariant, including those of each task.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        if self.job_number.is_empty() {
            return Err(ValidationError::empty_field("job_number").into());
        }
        if self.quantity == 0 {
            return Err(ValidationError::out_of_range("quantity", 1, i64::from(u32::MAX), 0).into());
        }
        if self.current_operation_sequence > MAX_SEQUENCE {
            return Err(ValidationError::out_of_range(
                "current_operation_sequence",
                0,
                i64::from(MAX_SEQUENCE),
                i64::from(self.current_operation_sequence),
            )
            .into());
        }
        if let (Some(start), Some(end)) = (self.planned_start, self.planned_end) {
            if start >= end {
                return Err(self.rule("schedule_window", "Planned end must be after planned start"));
            }
        }
        for pair in self.tasks.windows(2) {
            if pair[0].sequence_in_job() >= pair[1].sequence_in_job() {
                return Err(DomainError::new(
                    ErrorCode::DuplicateSequence,
                    "Task sequence numbers must be unique and ordered",
                )
                .with_detail("sequence_in_job", pair[1].sequence_in_job().to_string()));
            }
        }
        for task in &self.tasks {
            if task.job_id() != self.id {
                return Err(self.rule("foreign_task", "Task belongs to another job"));
            }
            task.check_invariants()?;
        }
        if self.status == JobStatus::Completed && self.tasks.iter().any(|t| !t.status().is_finished()) {
            return Err(self.rule("incomplete_tasks", "Completed job has unfinished tasks"));
        }
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────────

    /// Runs `op` against the job, then checks invariants. On any failure the
    /// job is restored to its state before the call.
    fn mutate<T>(
        &mut self,
        now: Timestamp,
        op: impl FnOnce(&mut Self) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let snapshot = self.clone();
        let result = op(self).and_then(|value| {
            self.check_invariants()?;
            Ok(value)
        });
        match result {
            Ok(value) => {
                self.updated_at = self.updated_at.max(now);
                Ok(value)
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn apply_status(&mut self, target: JobStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }

    /// Marks the first unfinished task READY if it is still PENDING.
    fn ready_first_open_task(&mut self) -> Result<(), DomainError> {
        if let Some(first) = self.tasks.iter_mut().find(|t| !t.status().is_finished()) {
            if first.status() == TaskStatus::Pending {
                first.mark_ready()?;
            }
        }
        Ok(())
    }

    fn cancel_open_tasks(&mut self, now: Timestamp) -> Result<(), DomainError> {
        let mut cancelled = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| !t.status().is_finished()) {
            task.cancel()?;
            cancelled.push((task.id(), task.sequence_in_job()));
        }
        for (task_id, sequence_in_job) in cancelled {
            self.record_event(
                now,
                JobEventKind::TaskCancelled {
                    task_id,
                    sequence_in_job,
                },
            );
        }
        Ok(())
    }

    fn ensure_not_terminal(&self, action: &str) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::JobTerminal,
                format!("Cannot {} a {} job", action, self.status),
            )
            .with_detail("job_id", self.id.to_string())
            .with_detail("status", self.status.to_string()));
        }
        Ok(())
    }

    fn task_mut(&mut self, sequence: u32) -> Result<&mut Task, DomainError> {
        let job_id = self.id;
        self.tasks
            .iter_mut()
            .find(|t| t.sequence_in_job() == sequence)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TaskNotFound,
                    format!("Job has no task with sequence {}", sequence),
                )
                .with_detail("job_id", job_id.to_string())
                .with_detail("sequence_in_job", sequence.to_string())
            })
    }

    fn rule(&self, rule: &str, message: impl Into<String>) -> DomainError {
        DomainError::business_rule(rule, message).with_detail("job_id", self.id.to_string())
    }

    fn record_event(&mut self, now: Timestamp, kind: JobEventKind) {
        self.domain_events.push(JobEvent::new(self.id, now, kind));
    }
}

/// Trims and uppercases a job number; only `A-Z 0-9 - _ .` may remain.
fn sanitize_job_number(raw: &str) -> Result<String, ValidationError> {
    let number = raw.trim().to_ascii_uppercase();
    if number.is_empty() {
        return Err(ValidationError::empty_field("job_number"));
    }
    if let Some(bad) = number
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ValidationError::invalid_format(
            "job_number",
            format!("character '{}' is not allowed", bad),
        ));
    }
    Ok(number)
}

fn required_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(value.to_string())
}
