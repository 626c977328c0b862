//! Critical-path and bottleneck analysis over job task chains.
//!
//! Precedence inside a job is the linear order of `sequence_in_job`, so a
//! job's critical path is its whole chain of live tasks. The interesting
//! questions are whether that chain fits the job window and which resources
//! are committed beyond their working capacity.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::calendar::BusinessCalendar;
use crate::domain::foundation::{
    Duration, JobId, JobStatus, MachineId, StateMachine, TaskId, TaskStatus, TimeWindow,
    Timestamp, ValueObjectError, WindowKind,
};
use crate::domain::job::{Job, Task};
use crate::domain::resources::ResourcePool;

/// Default utilization above which a resource is reported as a bottleneck.
pub const DEFAULT_BOTTLENECK_THRESHOLD_PERCENT: u32 = 85;

/// Critical-path summary for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPathReport {
    pub job_id: JobId,
    /// Unfinished tasks of the chain, in sequence order.
    pub critical_task_ids: Vec<TaskId>,
    /// Σ of the fastest machine option over every non-cancelled task.
    pub critical_path_duration: Duration,
    /// Same sum restricted to tasks that are not yet completed.
    pub remaining_duration: Duration,
    /// Wall-clock minutes between the job's start and its due date.
    pub window_minutes: i64,
    /// `window_minutes - critical_path_duration`, negative when the chain overruns.
    pub slack_minutes: i64,
    pub fits: bool,
}

/// How committed time is grouped when looking for bottlenecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGrouping {
    #[default]
    Machine,
    Zone,
}

/// A machine or a zone of machines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceKey {
    Machine(MachineId),
    Zone(String),
}

/// A resource whose committed time exceeds the utilization threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub resource: ResourceKey,
    pub committed: Duration,
    pub capacity: Duration,
    /// Committed over capacity, may exceed 100.
    pub utilization_percent: u32,
    /// Committed minutes above the threshold share of capacity.
    pub excess_minutes: i64,
    pub affected_jobs: Vec<JobId>,
    pub earliest_due_date: Timestamp,
}

/// Stateless analyser for critical paths and resource bottlenecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalSequenceManager {
    threshold_percent: u32,
    grouping: ResourceGrouping,
}

impl Default for CriticalSequenceManager {
    fn default() -> Self {
        Self::new(DEFAULT_BOTTLENECK_THRESHOLD_PERCENT)
    }
}

#[derive(Default)]
struct Load {
    committed: Duration,
    machines: usize,
    jobs: BTreeMap<JobId, Timestamp>,
}

impl CriticalSequenceManager {
    pub fn new(threshold_percent: u32) -> Self {
        Self {
            threshold_percent,
            grouping: ResourceGrouping::Machine,
        }
    }

    pub fn with_grouping(mut self, grouping: ResourceGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn threshold_percent(&self) -> u32 {
        self.threshold_percent
    }

    /// Computes the critical path of a single job.
    pub fn critical_path(&self, job: &Job) -> CriticalPathReport {
        let chain: Vec<&Task> = job
            .tasks()
            .iter()
            .filter(|t| t.status() != TaskStatus::Cancelled)
            .collect();
        let critical_path_duration: Duration = chain.iter().map(|t| t.min_duration()).sum();
        let remaining_duration: Duration = chain
            .iter()
            .filter(|t| t.status() != TaskStatus::Completed)
            .map(|t| t.min_duration())
            .sum();
        let (start, due) = job.job_window();
        let window_minutes = due.minutes_since(&start).max(0);
        let slack_minutes = window_minutes - critical_path_duration.ceil_minutes();

        CriticalPathReport {
            job_id: job.id(),
            critical_task_ids: chain
                .iter()
                .filter(|t| !t.status().is_finished())
                .map(|t| t.id())
                .collect(),
            critical_path_duration,
            remaining_duration,
            window_minutes,
            slack_minutes,
            fits: slack_minutes >= 0,
        }
    }

    /// Critical paths of every job that is not yet terminal, tightest slack first.
    pub fn critical_paths(&self, jobs: &[Job]) -> Vec<CriticalPathReport> {
        let mut reports: Vec<CriticalPathReport> = jobs
            .iter()
            .filter(|j| !j.status().is_terminal())
            .map(|j| self.critical_path(j))
            .collect();
        reports.sort_by_key(|r| (r.slack_minutes, r.job_id));
        reports
    }

    /// Finds resources whose committed task time inside `window` exceeds the
    /// threshold share of their working capacity.
    ///
    /// Only scheduled tasks with an assigned machine contribute. Results are
    /// ranked by excess minutes, then by the earliest due date among the
    /// affected jobs.
    pub fn identify_bottleneck_sequences(
        &self,
        jobs: &[Job],
        window: &TimeWindow,
        calendar: &BusinessCalendar,
        resources: &ResourcePool,
    ) -> Result<Vec<Bottleneck>, ValueObjectError> {
        let Some((from, to)) = window.absolute_bounds() else {
            return Err(ValueObjectError::IncompatibleWindowKind {
                left: WindowKind::Relative.as_str(),
                right: WindowKind::Absolute.as_str(),
            });
        };
        let per_machine_capacity = calendar.working_minutes_between(&from, &to);

        let mut loads: HashMap<ResourceKey, Load> = HashMap::new();
        if self.grouping == ResourceGrouping::Zone {
            for machine in resources.machines() {
                loads
                    .entry(ResourceKey::Zone(machine.zone.clone()))
                    .or_default()
                    .machines += 1;
            }
        }

        for job in jobs.iter().filter(|j| j.status() != JobStatus::Cancelled) {
            for task in job.tasks() {
                let Some(machine_id) = task.assigned_machine_id() else {
                    continue;
                };
                if task.status().is_finished() && task.status() != TaskStatus::Completed {
                    continue;
                }
                let Some(planned) = task.planned_window() else {
                    continue;
                };
                let Some(overlap) = planned.intersection_with(window)? else {
                    continue;
                };
                let key = match self.grouping {
                    ResourceGrouping::Machine => ResourceKey::Machine(machine_id),
                    ResourceGrouping::Zone => match resources.machine(&machine_id) {
                        Some(machine) => ResourceKey::Zone(machine.zone.clone()),
                        None => ResourceKey::Machine(machine_id),
                    },
                };
                let load = loads.entry(key).or_default();
                load.committed = load.committed.add(&overlap.duration());
                load.jobs.insert(job.id(), job.due_date());
            }
        }

        let mut bottlenecks: Vec<Bottleneck> = loads
            .into_iter()
            .filter(|(_, load)| !load.jobs.is_empty())
            .filter_map(|(resource, load)| self.evaluate(resource, load, &per_machine_capacity))
            .collect();
        bottlenecks.sort_by(|a, b| {
            b.excess_minutes
                .cmp(&a.excess_minutes)
                .then(a.earliest_due_date.cmp(&b.earliest_due_date))
                .then_with(|| a.resource.cmp(&b.resource))
        });
        tracing::debug!(
            count = bottlenecks.len(),
            threshold = self.threshold_percent,
            "bottleneck analysis complete"
        );
        Ok(bottlenecks)
    }

    fn evaluate(
        &self,
        resource: ResourceKey,
        load: Load,
        per_machine_capacity: &Duration,
    ) -> Option<Bottleneck> {
        let capacity = per_machine_capacity.times(load.machines.max(1) as u32);
        let committed_minutes = load.committed.ceil_minutes();
        let capacity_minutes = capacity.whole_minutes();
        let threshold_minutes = capacity_minutes * i64::from(self.threshold_percent) / 100;
        if committed_minutes <= threshold_minutes {
            return None;
        }
        let utilization_percent = if capacity_minutes == 0 {
            u32::MAX
        } else {
            u32::try_from(committed_minutes * 100 / capacity_minutes).unwrap_or(u32::MAX)
        };
        let earliest_due_date = load.jobs.values().min().copied()?;
        Some(Bottleneck {
            resource,
            committed: load.committed,
            capacity,
            utilization_percent,
            excess_minutes: committed_minutes - threshold_minutes,
            affected_jobs: load.jobs.into_keys().collect(),
            earliest_due_date,
        })
    }
}
