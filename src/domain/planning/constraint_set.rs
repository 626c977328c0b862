//! The constraint set handed to an external scheduling solver.

use serde::{Deserialize, Serialize};

use crate::domain::calendar::BusinessCalendar;
use crate::domain::foundation::{
    DomainError, Duration, JobId, JobStatus, MachineId, OperatorId, PriorityLevel, TaskId,
    TimeWindow, Timestamp, ValueObjectError, WindowKind,
};
use crate::domain::job::{Job, Task};
use crate::domain::resources::{ResourcePool, SkillRequirements};

/// One way to run a task: on `machine_id` for `run_time` after `setup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationOption {
    pub machine_id: MachineId,
    pub setup: Duration,
    /// Routing time adjusted by the machine's efficiency factor.
    pub run_time: Duration,
    /// Skills an operator needs on this machine (task and machine combined).
    pub skill_requirements: SkillRequirements,
    pub requires_operator_for_run: bool,
}

impl DurationOption {
    pub fn total(&self) -> Duration {
        self.setup.add(&self.run_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConstraint {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub sequence_in_job: u32,
    pub options: Vec<DurationOption>,
    pub earliest_start: Timestamp,
    pub due_date: Timestamp,
    pub priority: PriorityLevel,
    /// Weight for tardiness in the objective, from the job priority.
    pub priority_weight: u32,
}

/// `before` must finish before `after` starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceEdge {
    pub before: TaskId,
    pub after: TaskId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCandidate {
    pub operator_id: OperatorId,
    pub name: String,
}

/// Why a task was left out of the constraint set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedTask {
    pub task_id: TaskId,
    pub reason: String,
}

/// Everything a solver needs to produce a schedule for the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub horizon: TimeWindow,
    pub tasks: Vec<TaskConstraint>,
    pub precedences: Vec<PrecedenceEdge>,
    /// Absolute working windows inside the horizon.
    pub calendar_windows: Vec<TimeWindow>,
    pub operators: Vec<OperatorCandidate>,
    pub excluded: Vec<ExcludedTask>,
}

impl ConstraintSet {
    /// Builds the constraint set for every open task of the active jobs.
    ///
    /// Jobs on hold or terminal are skipped. Tasks already started or
    /// finished are fixed and left out. A task with no usable machine is
    /// reported in `excluded` rather than failing the whole build.
    pub fn build(
        jobs: &[Job],
        resources: &ResourcePool,
        calendar: &BusinessCalendar,
        horizon: &TimeWindow,
    ) -> Result<Self, DomainError> {
        let Some((from, to)) = horizon.absolute_bounds() else {
            return Err(ValueObjectError::IncompatibleWindowKind {
                left: WindowKind::Relative.as_str(),
                right: WindowKind::Absolute.as_str(),
            }
            .into());
        };

        let mut tasks = Vec::new();
        let mut precedences = Vec::new();
        let mut excluded = Vec::new();

        for job in jobs.iter().filter(|j| plannable(j.status())) {
            let earliest = job.release_date().map_or(from, |r| r.max(from));
            let mut previous: Option<TaskId> = None;
            for task in job.tasks().iter().filter(|t| t.status().is_reschedulable()) {
                let options = Self::options_for(task, resources);
                if options.is_empty() {
                    excluded.push(ExcludedTask {
                        task_id: task.id(),
                        reason: "no available machine among the routing options".to_string(),
                    });
                    continue;
                }
                if let Some(before) = previous {
                    precedences.push(PrecedenceEdge {
                        before,
                        after: task.id(),
                    });
                }
                previous = Some(task.id());
                tasks.push(TaskConstraint {
                    job_id: job.id(),
                    task_id: task.id(),
                    sequence_in_job: task.sequence_in_job(),
                    options,
                    earliest_start: earliest,
                    due_date: job.due_date(),
                    priority: job.priority(),
                    priority_weight: job.priority().weight_factor(),
                });
            }
        }

        let days = u32::try_from(to.duration_since(&from).num_days()).unwrap_or(u32::MAX);
        let calendar_windows = calendar
            .working_windows(&from, days)
            .into_iter()
            .filter_map(|w| w.intersection_with(horizon).ok().flatten())
            .collect();

        let mut operators: Vec<OperatorCandidate> = resources
            .operators()
            .filter(|o| o.is_assignable())
            .map(|o| OperatorCandidate {
                operator_id: o.id,
                name: o.name.clone(),
            })
            .collect();
        operators.sort_by_key(|o| o.operator_id);

        tracing::debug!(
            tasks = tasks.len(),
            precedences = precedences.len(),
            excluded = excluded.len(),
            "constraint set built"
        );
        Ok(Self {
            horizon: *horizon,
            tasks,
            precedences,
            calendar_windows,
            operators,
            excluded,
        })
    }

    fn options_for(task: &Task, resources: &ResourcePool) -> Vec<DurationOption> {
        task.machine_options()
            .iter()
            .filter_map(|option| {
                let machine = resources.machine(&option.machine_id)?;
                if !machine.can_accept_work() {
                    return None;
                }
                Some(DurationOption {
                    machine_id: machine.id,
                    setup: task.planned_setup(),
                    run_time: machine.run_time(&option.duration),
                    skill_requirements: task
                        .skill_requirements()
                        .merged_with(&machine.skill_requirements),
                    requires_operator_for_run: machine.automation_level.requires_operator_for_run(),
                })
            })
            .collect()
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&TaskConstraint> {
        self.tasks.iter().find(|t| &t.task_id == task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Working capacity of the horizon on a single machine.
    pub fn working_capacity(&self) -> Duration {
        self.calendar_windows.iter().map(TimeWindow::duration).sum()
    }
}

fn plannable(status: JobStatus) -> bool {
    matches!(
        status,
        JobStatus::Planned | JobStatus::Released | JobStatus::InProgress
    )
}
