//! SolveScheduleHandler - hands open work to the solver and commits the result.
//!
//! Solver output is applied to copies of the affected jobs and validated
//! against the calendar, the resource pool and every other job's bookings.
//! Only a result without violations is saved; anything else leaves the
//! repository untouched.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;

use crate::domain::calendar::BusinessCalendar;
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, JobId, StateMachine, TimeWindow, Timestamp,
};
use crate::domain::job::{Job, JobEvent};
use crate::domain::planning::{
    apply_assignments, group_by_job, ConstraintSet, ExcludedTask, SolverAssignment,
    SolverFailure,
};
use crate::domain::resources::ResourcePool;
use crate::domain::validation::{
    Booking, ScheduleContext, ScheduleValidator, ValidationReport, ValidationWarning,
};
use crate::ports::{Clock, EventPublisher, JobFilter, JobRepository, ScheduleSolver};

use super::publish_job_events;

/// Tunables taken from `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveSettings {
    pub solver_timeout: StdDuration,
    pub due_date_warning_percent: u32,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            solver_timeout: StdDuration::from_secs(30),
            due_date_warning_percent: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveScheduleCommand {
    /// Absolute planning horizon.
    pub horizon: TimeWindow,
    /// Which jobs to plan; defaults to the active ones.
    pub filter: JobFilter,
}

impl SolveScheduleCommand {
    pub fn for_active_jobs(horizon: TimeWindow) -> Self {
        Self {
            horizon,
            filter: JobFilter::active(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveScheduleResult {
    /// Jobs whose tasks were planned, as saved.
    pub updated_jobs: Vec<Job>,
    pub scheduled_tasks: usize,
    /// Tasks left out of the constraint set and why.
    pub excluded: Vec<ExcludedTask>,
    /// Warnings of the accepted schedule (due-date risk, unscheduled tasks).
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Error)]
pub enum SolveScheduleError {
    #[error("solver {solver} returned {failure}")]
    Solver {
        solver: &'static str,
        failure: SolverFailure,
    },

    #[error("solver output rejected with {} violation(s)", report.violations.len())]
    Rejected { report: ValidationReport },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl SolveScheduleError {
    /// The validation report when the schedule was rejected.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            SolveScheduleError::Rejected { report } => Some(report),
            _ => None,
        }
    }
}

impl From<SolveScheduleError> for DomainError {
    fn from(err: SolveScheduleError) -> Self {
        match err {
            SolveScheduleError::Solver { solver, failure } => {
                DomainError::from(failure).with_detail("solver", solver)
            }
            SolveScheduleError::Rejected { report } => DomainError::new(
                ErrorCode::ScheduleRejected,
                format!("Schedule rejected: {}", report.messages().join("; ")),
            )
            .with_detail("violations", report.violations.len().to_string()),
            SolveScheduleError::Domain(err) => err,
        }
    }
}

pub struct SolveScheduleHandler {
    job_repository: Arc<dyn JobRepository>,
    solver: Arc<dyn ScheduleSolver>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    calendar: Arc<BusinessCalendar>,
    resources: Arc<ResourcePool>,
    settings: SolveSettings,
}

impl SolveScheduleHandler {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        solver: Arc<dyn ScheduleSolver>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        calendar: Arc<BusinessCalendar>,
        resources: Arc<ResourcePool>,
    ) -> Self {
        Self {
            job_repository,
            solver,
            event_publisher,
            clock,
            calendar,
            resources,
            settings: SolveSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SolveSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn handle(
        &self,
        cmd: SolveScheduleCommand,
        metadata: CommandMetadata,
    ) -> Result<SolveScheduleResult, SolveScheduleError> {
        let now = self.clock.now();
        let jobs = self.job_repository.find_by_filters(&cmd.filter).await?;
        let constraints =
            ConstraintSet::build(&jobs, &self.resources, &self.calendar, &cmd.horizon)?;

        if constraints.is_empty() {
            tracing::debug!(jobs = jobs.len(), "nothing to schedule");
            return Ok(SolveScheduleResult {
                updated_jobs: Vec::new(),
                scheduled_tasks: 0,
                excluded: constraints.excluded,
                warnings: Vec::new(),
            });
        }

        let assignments = self.run_solver(&constraints).await?;
        let (mut grouped, orphans) = group_by_job(&jobs, assignments);
        if let Some(orphan) = orphans.first() {
            return Err(DomainError::new(
                ErrorCode::ScheduleRejected,
                "Solver returned a task outside the constraint set",
            )
            .with_detail("task_id", orphan.task_id.to_string())
            .into());
        }

        // Apply to copies; the originals stay untouched until validation passes.
        let mut candidates: Vec<Job> = Vec::new();
        let mut scheduled_tasks = 0;
        for job in &jobs {
            if let Some(assignments) = grouped.remove(&job.id()) {
                let mut candidate = job.clone();
                scheduled_tasks += apply_assignments(&mut candidate, &assignments, now)?;
                candidates.push(candidate);
            }
        }

        let report = self.validate(&candidates, &jobs, now).await?;
        if !report.is_valid {
            tracing::warn!(
                solver = self.solver.name(),
                violations = report.violations.len(),
                "rejecting solver output"
            );
            return Err(SolveScheduleError::Rejected { report });
        }

        let updated_jobs = self.commit(candidates, &metadata).await?;
        tracing::info!(
            solver = self.solver.name(),
            jobs = updated_jobs.len(),
            tasks = scheduled_tasks,
            excluded = constraints.excluded.len(),
            "schedule committed"
        );
        Ok(SolveScheduleResult {
            updated_jobs,
            scheduled_tasks,
            excluded: constraints.excluded,
            warnings: report.warnings,
        })
    }

    async fn run_solver(
        &self,
        constraints: &ConstraintSet,
    ) -> Result<Vec<SolverAssignment>, SolveScheduleError> {
        let solver = self.solver.name();
        tracing::debug!(
            solver,
            tasks = constraints.tasks.len(),
            precedences = constraints.precedences.len(),
            "invoking solver"
        );
        let outcome = match tokio::time::timeout(
            self.settings.solver_timeout,
            self.solver.solve(constraints),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(solver, timeout = ?self.settings.solver_timeout, "solver timed out");
                return Err(SolveScheduleError::Solver {
                    solver,
                    failure: SolverFailure::Timeout,
                });
            }
        };
        outcome
            .into_result()
            .map_err(|failure| SolveScheduleError::Solver { solver, failure })
    }

    /// Validates every candidate against the others and all other stored jobs.
    async fn validate(
        &self,
        candidates: &[Job],
        solved: &[Job],
        now: Timestamp,
    ) -> Result<ValidationReport, DomainError> {
        let candidate_ids: Vec<JobId> = candidates.iter().map(|j| j.id()).collect();
        let solved_ids: Vec<JobId> = solved.iter().map(|j| j.id()).collect();

        // Jobs outside the solved set (e.g. on hold) still hold their bookings.
        let others = self.job_repository.find_by_filters(&JobFilter::new()).await?;
        let mut bookings: Vec<Booking> = others
            .iter()
            .filter(|j| !solved_ids.contains(&j.id()) && !j.status().is_terminal())
            .flat_map(Booking::from_job)
            .collect();
        bookings.extend(
            solved
                .iter()
                .filter(|j| !candidate_ids.contains(&j.id()))
                .flat_map(Booking::from_job),
        );
        bookings.extend(candidates.iter().flat_map(Booking::from_job));

        let validator = ScheduleValidator::new(self.settings.due_date_warning_percent);
        let ctx = ScheduleContext {
            calendar: &self.calendar,
            resources: &self.resources,
            bookings: &bookings,
            as_of: now.date(),
        };
        Ok(candidates
            .iter()
            .map(|job| validator.validate_complete(job, &ctx))
            .fold(ValidationReport::new(Vec::new(), Vec::new()), ValidationReport::merge))
    }

    async fn commit(
        &self,
        candidates: Vec<Job>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<Job>, DomainError> {
        let mut saved = Vec::with_capacity(candidates.len());
        let mut events: Vec<JobEvent> = Vec::new();
        for mut job in candidates {
            let drained = job.take_events();
            saved.push(self.job_repository.save_job(job).await?);
            events.extend(drained);
        }
        publish_job_events(self.event_publisher.as_ref(), events, metadata).await?;
        Ok(saved)
    }
}
