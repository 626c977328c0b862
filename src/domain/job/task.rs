//! Task entity: one routing operation of a job.
//!
//! Tasks are owned by their `Job` and mutated only through it; every mutator
//! here is crate-private.

use serde::{Deserialize, Serialize};

use super::{AssignmentType, OperatorAssignment};
use crate::domain::foundation::{
    DomainError, Duration, ErrorCode, JobId, MachineId, OperationId, OperatorId, StateMachine,
    TaskId, TaskStatus, TimeWindow, Timestamp, ValidationError,
};
use crate::domain::resources::SkillRequirements;

pub const MIN_SEQUENCE: u32 = 1;
pub const MAX_SEQUENCE: u32 = 100;

/// A machine that can perform the task and the run time it needs there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineOption {
    pub machine_id: MachineId,
    pub duration: Duration,
}

/// Input for `Job::add_task`.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub operation_id: OperationId,
    pub sequence_in_job: u32,
    pub planned_setup: Duration,
    pub machine_options: Vec<MachineOption>,
    pub skill_requirements: SkillRequirements,
}

impl NewTask {
    pub fn new(sequence_in_job: u32) -> Self {
        Self {
            operation_id: OperationId::new(),
            sequence_in_job,
            planned_setup: Duration::ZERO,
            machine_options: Vec::new(),
            skill_requirements: SkillRequirements::new(),
        }
    }

    pub fn with_setup(mut self, setup: Duration) -> Self {
        self.planned_setup = setup;
        self
    }

    pub fn with_machine_option(mut self, machine_id: MachineId, duration: Duration) -> Self {
        self.machine_options.push(MachineOption {
            machine_id,
            duration,
        });
        self
    }

    pub fn with_skill_requirements(mut self, requirements: SkillRequirements) -> Self {
        self.skill_requirements = requirements;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    job_id: JobId,
    operation_id: OperationId,
    sequence_in_job: u32,
    status: TaskStatus,
    planned_start: Option<Timestamp>,
    planned_end: Option<Timestamp>,
    /// First planned start, kept to measure delay across reschedules.
    original_planned_start: Option<Timestamp>,
    actual_start: Option<Timestamp>,
    actual_end: Option<Timestamp>,
    planned_setup: Duration,
    actual_setup: Option<Duration>,
    assigned_machine_id: Option<MachineId>,
    machine_options: Vec<MachineOption>,
    skill_requirements: SkillRequirements,
    is_critical_path: bool,
    delay_minutes: i64,
    rework_count: u32,
    failure_reason: Option<String>,
    operator_assignments: Vec<OperatorAssignment>,
}

impl Task {
    pub(crate) fn new(job_id: JobId, new_task: NewTask) -> Result<Self, ValidationError> {
        if !(MIN_SEQUENCE..=MAX_SEQUENCE).contains(&new_task.sequence_in_job) {
            return Err(ValidationError::out_of_range(
                "sequence_in_job",
                i64::from(MIN_SEQUENCE),
                i64::from(MAX_SEQUENCE),
                i64::from(new_task.sequence_in_job),
            ));
        }
        Ok(Self {
            id: TaskId::new(),
            job_id,
            operation_id: new_task.operation_id,
            sequence_in_job: new_task.sequence_in_job,
            status: TaskStatus::Pending,
            planned_start: None,
            planned_end: None,
            original_planned_start: None,
            actual_start: None,
            actual_end: None,
            planned_setup: new_task.planned_setup,
            actual_setup: None,
            assigned_machine_id: None,
            machine_options: new_task.machine_options,
            skill_requirements: new_task.skill_requirements,
            is_critical_path: false,
            delay_minutes: 0,
            rework_count: 0,
            failure_reason: None,
            operator_assignments: Vec::new(),
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn operation_id(&self) -> OperationId {
        self.operation_id
    }

    pub fn sequence_in_job(&self) -> u32 {
        self.sequence_in_job
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn planned_start(&self) -> Option<Timestamp> {
        self.planned_start
    }

    pub fn planned_end(&self) -> Option<Timestamp> {
        self.planned_end
    }

    /// Start of the first plan, kept across reschedules.
    pub fn original_planned_start(&self) -> Option<Timestamp> {
        self.original_planned_start
    }

    pub fn actual_start(&self) -> Option<Timestamp> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<Timestamp> {
        self.actual_end
    }

    pub fn planned_setup(&self) -> Duration {
        self.planned_setup
    }

    pub fn actual_setup(&self) -> Option<Duration> {
        self.actual_setup
    }

    pub fn assigned_machine_id(&self) -> Option<MachineId> {
        self.assigned_machine_id
    }

    pub fn machine_options(&self) -> &[MachineOption] {
        &self.machine_options
    }

    pub fn skill_requirements(&self) -> &SkillRequirements {
        &self.skill_requirements
    }

    pub fn is_critical_path(&self) -> bool {
        self.is_critical_path
    }

    pub fn delay_minutes(&self) -> i64 {
        self.delay_minutes
    }

    pub fn rework_count(&self) -> u32 {
        self.rework_count
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn operator_assignments(&self) -> &[OperatorAssignment] {
        &self.operator_assignments
    }

    pub fn is_scheduled(&self) -> bool {
        self.planned_start.is_some() && self.planned_end.is_some()
    }

    /// Planned interval as an absolute window.
    pub fn planned_window(&self) -> Option<TimeWindow> {
        match (self.planned_start, self.planned_end) {
            (Some(start), Some(end)) => TimeWindow::absolute(start, end).ok(),
            _ => None,
        }
    }

    /// Run time on a specific machine, if it is one of the routing options.
    pub fn duration_on(&self, machine_id: &MachineId) -> Option<Duration> {
        self.machine_options
            .iter()
            .find(|o| &o.machine_id == machine_id)
            .map(|o| o.duration)
    }

    /// Shortest possible run time: the fastest machine option, or the
    /// planned window length when no options are routed.
    pub fn min_duration(&self) -> Duration {
        self.machine_options
            .iter()
            .map(|o| o.duration)
            .min()
            .or_else(|| self.planned_window().map(|w| w.duration()))
            .unwrap_or(Duration::ZERO)
    }

    /// Window during which an operator assignment occupies the operator.
    ///
    /// Explicit planned windows win; otherwise setup-only bookings cover the
    /// setup at the start of the task and full-duration bookings the whole task.
    pub fn assignment_window(&self, assignment: &OperatorAssignment) -> Option<TimeWindow> {
        if let Some(window) = assignment.planned_window() {
            return Some(window);
        }
        let (start, end) = (self.planned_start?, self.planned_end?);
        match assignment.assignment_type() {
            AssignmentType::FullDuration => TimeWindow::absolute(start, end).ok(),
            AssignmentType::SetupOnly => {
                let setup_end = start.plus(self.planned_setup.to_chrono()).min(end);
                TimeWindow::absolute(start, setup_end).ok()
            }
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Mutators (driven by Job)
    // ───────────────────────────────────────────────────────────────

    fn transition(&mut self, target: TaskStatus) -> Result<(), DomainError> {
        let sequence = self.sequence_in_job.to_string();
        self.status = self
            .status
            .transition_to(target)
            .map_err(|e| DomainError::from(e).with_detail("sequence_in_job", sequence))?;
        Ok(())
    }

    fn ensure_window(&self, start: Timestamp, end: Timestamp) -> Result<(), DomainError> {
        if start >= end {
            return Err(self
                .rule("schedule_window", "Task must end after it starts")
                .with_detail("start", start.to_string())
                .with_detail("end", end.to_string()));
        }
        Ok(())
    }

    fn ensure_routed(&self, machine: Option<MachineId>) -> Result<(), DomainError> {
        match machine {
            Some(id) if !self.machine_options.is_empty() && self.duration_on(&id).is_none() => {
                Err(self
                    .rule("machine_not_routed", "Machine is not a routing option for this task")
                    .with_detail("machine_id", id.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn schedule(
        &mut self,
        start: Timestamp,
        end: Timestamp,
        machine: Option<MachineId>,
    ) -> Result<(), DomainError> {
        self.ensure_window(start, end)?;
        self.ensure_routed(machine)?;
        if self.status == TaskStatus::Scheduled {
            return Err(self.rule(
                "already_scheduled",
                "Task is already scheduled; reschedule it instead",
            ));
        }
        self.transition(TaskStatus::Scheduled)?;
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self.original_planned_start.get_or_insert(start);
        if machine.is_some() {
            self.assigned_machine_id = machine;
        }
        Ok(())
    }

    /// Moves the plan and records delay against the original planned start.
    pub(crate) fn reschedule(
        &mut self,
        start: Timestamp,
        end: Timestamp,
        machine: Option<MachineId>,
    ) -> Result<(), DomainError> {
        self.ensure_window(start, end)?;
        self.ensure_routed(machine)?;
        if !self.status.is_reschedulable() {
            return Err(self.rule(
                "not_reschedulable",
                format!("Task in status {} cannot be rescheduled", self.status),
            ));
        }
        let Some(original) = self.original_planned_start else {
            return Err(self.rule("not_scheduled", "Task has no plan to reschedule"));
        };
        if self.status == TaskStatus::Pending {
            self.transition(TaskStatus::Scheduled)?;
        }
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self.delay_minutes = start.minutes_since(&original).max(0);
        if machine.is_some() {
            self.assigned_machine_id = machine;
        }
        Ok(())
    }

    pub(crate) fn mark_ready(&mut self) -> Result<(), DomainError> {
        self.transition(TaskStatus::Ready)
    }

    pub(crate) fn start(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.transition(TaskStatus::InProgress)?;
        self.actual_start = Some(at);
        self.actual_end = None;
        Ok(())
    }

    pub(crate) fn complete(
        &mut self,
        at: Timestamp,
        actual_setup: Option<Duration>,
    ) -> Result<(), DomainError> {
        if let Some(started) = self.actual_start {
            if at <= started {
                return Err(self
                    .rule("actual_window", "Task must finish after it started")
                    .with_detail("actual_start", started.to_string())
                    .with_detail("actual_end", at.to_string()));
            }
        }
        self.transition(TaskStatus::Completed)?;
        self.actual_end = Some(at);
        if actual_setup.is_some() {
            self.actual_setup = actual_setup;
        }
        Ok(())
    }

    pub(crate) fn fail(&mut self, reason: String) -> Result<(), DomainError> {
        self.transition(TaskStatus::Failed)?;
        self.failure_reason = Some(reason);
        Ok(())
    }

    /// Sends a failed task back for another attempt.
    pub(crate) fn rework(&mut self) -> Result<(), DomainError> {
        self.transition(TaskStatus::Ready)?;
        self.rework_count += 1;
        self.actual_start = None;
        self.actual_end = None;
        self.failure_reason = None;
        for assignment in &mut self.operator_assignments {
            *assignment = OperatorAssignment::new(
                assignment.operator_id(),
                assignment.assignment_type(),
                assignment
                    .planned_window()
                    .and_then(|w| w.absolute_bounds()),
            )?;
        }
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(TaskStatus::Cancelled)
    }

    pub(crate) fn assign_operator(&mut self, assignment: OperatorAssignment) -> Result<(), DomainError> {
        if self.status.is_finished() {
            return Err(self.rule(
                "task_finished",
                format!("Cannot assign operators to a {} task", self.status),
            ));
        }
        if self.assignment(&assignment.operator_id()).is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateAssignment,
                "Operator is already assigned to this task",
            )
            .with_detail("operator_id", assignment.operator_id().to_string())
            .with_detail("sequence_in_job", self.sequence_in_job.to_string()));
        }
        self.operator_assignments.push(assignment);
        Ok(())
    }

    pub(crate) fn start_assignment(&mut self, operator_id: &OperatorId, at: Timestamp) -> Result<(), DomainError> {
        self.assignment_mut(operator_id)?.start(at)
    }

    pub(crate) fn complete_assignment(
        &mut self,
        operator_id: &OperatorId,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        self.assignment_mut(operator_id)?.complete(at)
    }

    pub(crate) fn set_critical_path(&mut self, critical: bool) {
        self.is_critical_path = critical;
    }

    fn assignment(&self, operator_id: &OperatorId) -> Option<&OperatorAssignment> {
        self.operator_assignments
            .iter()
            .find(|a| &a.operator_id() == operator_id)
    }

    fn assignment_mut(&mut self, operator_id: &OperatorId) -> Result<&mut OperatorAssignment, DomainError> {
        let sequence = self.sequence_in_job;
        self.operator_assignments
            .iter_mut()
            .find(|a| &a.operator_id() == operator_id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::OperatorNotFound, "Operator is not assigned to this task")
                    .with_detail("operator_id", operator_id.to_string())
                    .with_detail("sequence_in_job", sequence.to_string())
            })
    }

    fn rule(&self, rule: &str, message: impl Into<String>) -> DomainError {
        DomainError::business_rule(rule, message)
            .with_detail("task_id", self.id.to_string())
            .with_detail("sequence_in_job", self.sequence_in_job.to_string())
    }

    /// Checks every task-level invariant.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        if !(MIN_SEQUENCE..=MAX_SEQUENCE).contains(&self.sequence_in_job) {
            return Err(ValidationError::out_of_range(
                "sequence_in_job",
                i64::from(MIN_SEQUENCE),
                i64::from(MAX_SEQUENCE),
                i64::from(self.sequence_in_job),
            )
            .into());
        }
        if let (Some(start), Some(end)) = (self.planned_start, self.planned_end) {
            self.ensure_window(start, end)?;
        }
        if let (Some(start), Some(end)) = (self.actual_start, self.actual_end) {
            if end <= start {
                return Err(self.rule("actual_window", "Task must finish after it started"));
            }
        }
        if self.status == TaskStatus::Completed && self.actual_end.is_none() {
            return Err(self.rule("completed_without_end", "Completed task has no actual end"));
        }
        if self.status == TaskStatus::InProgress && self.actual_start.is_none() {
            return Err(self.rule("in_progress_without_start", "Task in progress has no actual start"));
        }
        if self.delay_minutes < 0 {
            return Err(self.rule("negative_delay", "Delay cannot be negative"));
        }
        for (i, assignment) in self.operator_assignments.iter().enumerate() {
            assignment.check_invariants()?;
            if self.operator_assignments[..i]
                .iter()
                .any(|a| a.operator_id() == assignment.operator_id())
            {
                return Err(DomainError::new(
                    ErrorCode::DuplicateAssignment,
                    "Operator is assigned twice to the same task",
                )
                .with_detail("operator_id", assignment.operator_id().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn task() -> Task {
        Task::new(JobId::new(), NewTask::new(10)).unwrap()
    }

    #[test]
    fn sequence_must_be_in_range() {
        assert!(Task::new(JobId::new(), NewTask::new(0)).is_err());
        assert!(Task::new(JobId::new(), NewTask::new(101)).is_err());
        assert!(Task::new(JobId::new(), NewTask::new(100)).is_ok());
    }

    #[test]
    fn schedule_rejects_inverted_window() {
        let mut t = task();
        let err = t
            .schedule(ts("2024-03-04T10:00:00Z"), ts("2024-03-04T10:00:00Z"), None)
            .unwrap_err();
        assert!(err.is_business_rule_violation());
        assert_eq!(err.detail("rule"), Some("schedule_window"));
        assert_eq!(t.status(), TaskStatus::Pending);
    }

    #[test]
    fn reschedule_records_delay_from_original_plan() {
        let mut t = task();
        t.schedule(ts("2024-03-04T08:00:00Z"), ts("2024-03-04T09:00:00Z"), None)
            .unwrap();
        t.reschedule(ts("2024-03-04T10:30:00Z"), ts("2024-03-04T11:30:00Z"), None)
            .unwrap();
        assert_eq!(t.delay_minutes(), 150);
        t.reschedule(ts("2024-03-04T09:00:00Z"), ts("2024-03-04T10:00:00Z"), None)
            .unwrap();
        assert_eq!(t.delay_minutes(), 60);
        t.reschedule(ts("2024-03-04T07:00:00Z"), ts("2024-03-04T08:00:00Z"), None)
            .unwrap();
        assert_eq!(t.delay_minutes(), 0);
    }

    #[test]
    fn machine_must_be_a_routing_option() {
        let routed = MachineId::new();
        let mut t = Task::new(
            JobId::new(),
            NewTask::new(10).with_machine_option(routed, Duration::from_minutes(30).unwrap()),
        )
        .unwrap();
        let err = t
            .schedule(
                ts("2024-03-04T08:00:00Z"),
                ts("2024-03-04T09:00:00Z"),
                Some(MachineId::new()),
            )
            .unwrap_err();
        assert_eq!(err.detail("rule"), Some("machine_not_routed"));
        t.schedule(ts("2024-03-04T08:00:00Z"), ts("2024-03-04T09:00:00Z"), Some(routed))
            .unwrap();
        assert_eq!(t.assigned_machine_id(), Some(routed));
    }

    #[test]
    fn min_duration_prefers_fastest_option() {
        let t = Task::new(
            JobId::new(),
            NewTask::new(10)
                .with_machine_option(MachineId::new(), Duration::from_minutes(45).unwrap())
                .with_machine_option(MachineId::new(), Duration::from_minutes(30).unwrap()),
        )
        .unwrap();
        assert_eq!(t.min_duration(), Duration::from_minutes(30).unwrap());
    }

    #[test]
    fn duplicate_operator_is_rejected() {
        let mut t = task();
        let op = OperatorId::new();
        t.assign_operator(OperatorAssignment::new(op, AssignmentType::FullDuration, None).unwrap())
            .unwrap();
        let err = t
            .assign_operator(OperatorAssignment::new(op, AssignmentType::SetupOnly, None).unwrap())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateAssignment);
    }

    #[test]
    fn rework_resets_actuals_and_counts() {
        let mut t = task();
        t.mark_ready().unwrap();
        t.start(ts("2024-03-04T08:00:00Z")).unwrap();
        t.fail("tool breakage".to_string()).unwrap();
        assert_eq!(t.failure_reason(), Some("tool breakage"));
        t.rework().unwrap();
        assert_eq!(t.status(), TaskStatus::Ready);
        assert_eq!(t.rework_count(), 1);
        assert!(t.actual_start().is_none());
        assert!(t.check_invariants().is_ok());
    }

    #[test]
    fn setup_only_assignment_covers_setup() {
        let mut t = Task::new(
            JobId::new(),
            NewTask::new(10).with_setup(Duration::from_minutes(20).unwrap()),
        )
        .unwrap();
        t.schedule(ts("2024-03-04T08:00:00Z"), ts("2024-03-04T10:00:00Z"), None)
            .unwrap();
        let a = OperatorAssignment::new(OperatorId::new(), AssignmentType::SetupOnly, None).unwrap();
        let window = t.assignment_window(&a).unwrap();
        assert_eq!(
            window.absolute_bounds(),
            Some((ts("2024-03-04T08:00:00Z"), ts("2024-03-04T08:20:00Z")))
        );
    }
}
