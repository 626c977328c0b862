//! Solver results and how they are applied to jobs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, JobId, MachineId, OperatorId, TaskId, Timestamp,
};
use crate::domain::job::{AssignmentType, Job, OperatorAssignment};

/// One scheduled task as returned by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverAssignment {
    pub task_id: TaskId,
    pub machine_id: MachineId,
    #[serde(default)]
    pub operator_ids: Vec<OperatorId>,
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverFailure {
    Infeasible,
    Timeout,
    Error(String),
}

impl fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverFailure::Infeasible => write!(f, "INFEASIBLE"),
            SolverFailure::Timeout => write!(f, "TIMEOUT"),
            SolverFailure::Error(detail) => write!(f, "ERROR: {}", detail),
        }
    }
}

impl From<SolverFailure> for DomainError {
    fn from(failure: SolverFailure) -> Self {
        match failure {
            SolverFailure::Infeasible => DomainError::new(
                ErrorCode::SolverInfeasible,
                "No schedule satisfies the constraints",
            ),
            SolverFailure::Timeout => {
                DomainError::new(ErrorCode::SolverTimeout, "Solver did not finish in time")
            }
            SolverFailure::Error(detail) => {
                DomainError::new(ErrorCode::SolverError, "Solver failed").with_detail("reason", detail)
            }
        }
    }
}

/// What came back from a solver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum SolverOutcome {
    Solved(Vec<SolverAssignment>),
    Failed(SolverFailure),
}

impl SolverOutcome {
    pub fn into_result(self) -> Result<Vec<SolverAssignment>, SolverFailure> {
        match self {
            SolverOutcome::Solved(assignments) => Ok(assignments),
            SolverOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Groups assignments by the job that owns each task.
///
/// Assignments for tasks not found in `jobs` are returned separately.
pub fn group_by_job(
    jobs: &[Job],
    assignments: Vec<SolverAssignment>,
) -> (HashMap<JobId, Vec<SolverAssignment>>, Vec<SolverAssignment>) {
    let owner: HashMap<TaskId, JobId> = jobs
        .iter()
        .flat_map(|job| job.tasks().iter().map(move |t| (t.id(), job.id())))
        .collect();
    let mut grouped: HashMap<JobId, Vec<SolverAssignment>> = HashMap::new();
    let mut orphans = Vec::new();
    for assignment in assignments {
        match owner.get(&assignment.task_id) {
            Some(job_id) => grouped.entry(*job_id).or_default().push(assignment),
            None => orphans.push(assignment),
        }
    }
    (grouped, orphans)
}

/// Applies solver assignments to one job.
///
/// Planned tasks are rescheduled, unplanned ones scheduled, and every
/// operator not yet on the task gets a full-duration assignment. The first
/// failure aborts; callers apply to a clone and discard it on error.
pub fn apply_assignments(
    job: &mut Job,
    assignments: &[SolverAssignment],
    now: Timestamp,
) -> Result<usize, DomainError> {
    let mut applied = 0;
    for assignment in assignments {
        let task = job.task_by_id(&assignment.task_id).ok_or_else(|| {
            DomainError::new(ErrorCode::TaskNotFound, "Solver returned an unknown task")
                .with_detail("task_id", assignment.task_id.to_string())
                .with_detail("job_id", job.id().to_string())
        })?;
        let sequence = task.sequence_in_job();
        let already_planned = task.original_planned_start().is_some();
        let assigned: Vec<OperatorId> = task
            .operator_assignments()
            .iter()
            .map(|a| a.operator_id())
            .collect();

        if already_planned {
            job.reschedule_task(
                sequence,
                assignment.start,
                assignment.end,
                Some(assignment.machine_id),
                now,
            )?;
        } else {
            job.schedule_task(
                sequence,
                assignment.start,
                assignment.end,
                Some(assignment.machine_id),
                now,
            )?;
        }
        for operator_id in assignment
            .operator_ids
            .iter()
            .filter(|id| !assigned.contains(id))
        {
            let booking =
                OperatorAssignment::new(*operator_id, AssignmentType::FullDuration, None)?;
            job.assign_operator(sequence, booking, now)?;
        }
        applied += 1;
    }
    Ok(applied)
}
