//! Labor and machine cost estimation for tasks and jobs.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Cost, Currency, Duration, TaskId, TaskStatus, ValueObjectError};
use crate::domain::job::{AssignmentType, Job, Task};
use crate::domain::resources::{Machine, ResourcePool};

/// Cost breakdown of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCost {
    pub task_id: TaskId,
    pub machine_cost: Cost,
    pub labor_cost: Cost,
    pub total: Cost,
}

/// Cost estimate of a whole job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCostEstimate {
    pub total: Cost,
    pub tasks: Vec<TaskCost>,
    /// Tasks skipped because no machine is assigned or the machine is unknown.
    pub unpriced_tasks: Vec<TaskId>,
}

/// Prices tasks as machine rate x (setup + run) plus each operator's rate x
/// the minutes they are tied to the task.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostEstimator;

impl CostEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Cost of running `task` on `machine` with the task's assigned operators.
    ///
    /// Operators missing from the pool are skipped.
    pub fn task_cost(
        &self,
        task: &Task,
        machine: &Machine,
        resources: &ResourcePool,
    ) -> Result<TaskCost, ValueObjectError> {
        let standard = task
            .duration_on(&machine.id)
            .unwrap_or_else(|| task.min_duration());
        let run = machine.run_time(&standard);
        let setup = task.planned_setup();
        let machine_cost = machine.hourly_rate.for_duration(&setup.add(&run));

        let mut labor_cost = Cost::zero(machine.hourly_rate.currency());
        for assignment in task.operator_assignments() {
            let Some(operator) = resources.operator(&assignment.operator_id()) else {
                continue;
            };
            let minutes = match assignment.assignment_type() {
                AssignmentType::SetupOnly => setup,
                AssignmentType::FullDuration => {
                    machine.automation_level.operator_minutes(&setup, &run)
                }
            };
            labor_cost = labor_cost.add(&operator.hourly_rate.for_duration(&minutes))?;
        }

        let total = machine_cost.add(&labor_cost)?;
        Ok(TaskCost {
            task_id: task.id(),
            machine_cost,
            labor_cost,
            total,
        })
    }

    /// Sums task costs over every assigned, non-cancelled task of the job.
    pub fn job_cost(
        &self,
        job: &Job,
        resources: &ResourcePool,
        currency: &Currency,
    ) -> Result<JobCostEstimate, ValueObjectError> {
        let mut total = Cost::zero(currency);
        let mut tasks = Vec::new();
        let mut unpriced_tasks = Vec::new();
        for task in job.tasks() {
            if task.status() == TaskStatus::Cancelled {
                continue;
            }
            let machine = task
                .assigned_machine_id()
                .and_then(|id| resources.machine(&id));
            let Some(machine) = machine else {
                unpriced_tasks.push(task.id());
                continue;
            };
            let cost = self.task_cost(task, machine, resources)?;
            total = total.add(&cost.total)?;
            tasks.push(cost);
        }
        Ok(JobCostEstimate {
            total: total.round_to_cents(),
            tasks,
            unpriced_tasks,
        })
    }

    /// Cost per produced part.
    pub fn unit_cost(&self, estimate: &JobCostEstimate, quantity: u32) -> Result<Cost, ValueObjectError> {
        Ok(estimate.total.per_unit(quantity)?.round_to_cents())
    }

    /// Operator time a task demands on `machine`, ignoring assignments.
    pub fn operator_demand(&self, task: &Task, machine: &Machine) -> Duration {
        let standard = task
            .duration_on(&machine.id)
            .unwrap_or_else(|| task.min_duration());
        machine
            .automation_level
            .operator_minutes(&task.planned_setup(), &machine.run_time(&standard))
    }
}
