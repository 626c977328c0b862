//! Integration tests for solver-driven scheduling and schedule analysis.
//!
//! Covers:
//! 1. SolveScheduleHandler committing a validated solver plan
//! 2. Rejection of solver output that breaks skill or calendar constraints
//! 3. Calendars loaded from a file feeding the validator
//! 4. Critical path refresh and bottleneck detection on committed plans
//!
//! The solver is the scripted in-memory mock; nothing leaves the process.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use tokio::sync::watch;

use jobshop_core::adapters::{
    FileCalendarLoader, FixedClock, InMemoryEventBus, InMemoryJobRepository, MockScheduleSolver,
};
use jobshop_core::application::{
    CreateJobCommand, CreateJobHandler, CriticalPathRefresher, CriticalPathRefresherConfig,
    SolveScheduleCommand, SolveScheduleError, SolveScheduleHandler,
};
use jobshop_core::domain::analysis::{CriticalSequenceManager, ResourceKey};
use jobshop_core::domain::calendar::BusinessCalendar;
use jobshop_core::domain::foundation::{
    CommandMetadata, Cost, DomainError, Duration, ErrorCode, JobStatus, MachineId, OperatorId,
    PriorityLevel, SkillLevel, TaskStatus, TimeWindow, Timestamp, UserId,
};
use jobshop_core::domain::job::{Job, NewJob, NewTask};
use jobshop_core::domain::planning::{SolverAssignment, SolverFailure, SolverOutcome};
use jobshop_core::domain::resources::{
    Machine, Operator, ResourcePool, SkillProficiency, SkillRequirements, SkillType,
};
use jobshop_core::domain::validation::{ViolationKind, WarningKind};
use jobshop_core::ports::{CalendarSource, JobFilter, JobRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn metadata() -> CommandMetadata {
    CommandMetadata::new(UserId::new("scheduler").unwrap()).with_source("solver")
}

fn welding() -> SkillType {
    SkillType::new("welding").unwrap()
}

fn week() -> SolveScheduleCommand {
    SolveScheduleCommand::for_active_jobs(
        TimeWindow::absolute(ts("2024-01-15T00:00:00Z"), ts("2024-01-20T00:00:00Z")).unwrap(),
    )
}

/// A cell with one welding robot, one certified welder and one trainee.
struct Cell {
    repo: Arc<InMemoryJobRepository>,
    bus: Arc<InMemoryEventBus>,
    clock: Arc<FixedClock>,
    resources: Arc<ResourcePool>,
    welder: MachineId,
    certified: OperatorId,
    trainee: OperatorId,
}

impl Cell {
    fn new() -> Self {
        let welder = Machine::new("Weld Robot 2", "fabrication", Cost::new(120, "USD").unwrap())
            .unwrap()
            .with_skill_requirements(
                SkillRequirements::new().require(welding(), SkillLevel::Intermediate),
            );
        let certified = Operator::new("Sam Okafor", Cost::new(40, "USD").unwrap())
            .unwrap()
            .with_proficiency(
                SkillProficiency::new(
                    welding(),
                    SkillLevel::Expert,
                    date(2022, 3, 1),
                    Some(date(2025, 3, 1)),
                )
                .unwrap(),
            );
        let trainee = Operator::new("Lee Park", Cost::new(25, "USD").unwrap())
            .unwrap()
            .with_proficiency(
                SkillProficiency::new(welding(), SkillLevel::Basic, date(2023, 9, 1), None)
                    .unwrap(),
            );

        Self {
            repo: Arc::new(InMemoryJobRepository::new()),
            bus: Arc::new(InMemoryEventBus::new()),
            clock: Arc::new(FixedClock::new(ts("2024-01-15T07:00:00Z"))),
            welder: welder.id,
            certified: certified.id,
            trainee: trainee.id,
            resources: Arc::new(ResourcePool::new(vec![welder], vec![certified, trainee])),
        }
    }

    async fn job(&self, number: &str, due: &str) -> Job {
        let tasks = [10, 20]
            .iter()
            .map(|s| {
                NewTask::new(*s)
                    .with_setup(Duration::from_minutes(15).unwrap())
                    .with_machine_option(self.welder, Duration::from_minutes(60).unwrap())
            })
            .collect();
        CreateJobHandler::new(self.repo.clone(), self.bus.clone(), self.clock.clone())
            .handle(
                CreateJobCommand {
                    job: NewJob {
                        job_number: number.to_string(),
                        customer_name: "Harbor Marine".to_string(),
                        part_number: "FRM-9".to_string(),
                        quantity: 4,
                        priority: PriorityLevel::High,
                        release_date: None,
                        due_date: ts(due),
                    },
                    tasks,
                },
                metadata(),
            )
            .await
            .unwrap()
    }

    fn solver_handler(
        &self,
        solver: MockScheduleSolver,
        calendar: BusinessCalendar,
    ) -> SolveScheduleHandler {
        SolveScheduleHandler::new(
            self.repo.clone(),
            Arc::new(solver),
            self.bus.clone(),
            self.clock.clone(),
            Arc::new(calendar),
            self.resources.clone(),
        )
    }

    fn assign(
        &self,
        job: &Job,
        sequence: u32,
        operator: OperatorId,
        start: &str,
        end: &str,
    ) -> SolverAssignment {
        SolverAssignment {
            task_id: job.task(sequence).unwrap().id(),
            machine_id: self.welder,
            operator_ids: vec![operator],
            start: ts(start),
            end: ts(end),
        }
    }
}

// =============================================================================
// Solving
// =============================================================================

#[tokio::test]
async fn qualified_plan_is_committed_with_operators() {
    let cell = Cell::new();
    let job = cell.job("WLD-100", "2024-01-19T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![
        cell.assign(&job, 10, cell.certified, "2024-01-15T08:00:00Z", "2024-01-15T09:15:00Z"),
        cell.assign(&job, 20, cell.certified, "2024-01-15T09:15:00Z", "2024-01-15T10:30:00Z"),
    ]));

    let result = cell
        .solver_handler(solver.clone(), BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap();

    assert_eq!(result.scheduled_tasks, 2);
    assert_eq!(result.updated_jobs.len(), 1);
    assert_eq!(solver.call_count(), 1);

    let stored = cell.repo.load_job(&job.id()).await.unwrap();
    for task in stored.tasks() {
        assert_eq!(task.status(), TaskStatus::Scheduled);
        assert_eq!(task.assigned_machine_id(), Some(cell.welder));
        assert_eq!(task.operator_assignments().len(), 1);
        assert_eq!(task.operator_assignments()[0].operator_id(), cell.certified);
    }
    assert_eq!(cell.bus.events_of_type("job.task_scheduled.v1").len(), 2);
    assert_eq!(cell.bus.events_of_type("job.operator_assigned.v1").len(), 2);
}

#[tokio::test]
async fn underqualified_operator_rejects_the_whole_plan() {
    let cell = Cell::new();
    let job = cell.job("WLD-101", "2024-01-19T15:00:00Z").await;
    let published = cell.bus.event_count();
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![
        cell.assign(&job, 10, cell.certified, "2024-01-15T08:00:00Z", "2024-01-15T09:15:00Z"),
        cell.assign(&job, 20, cell.trainee, "2024-01-15T09:15:00Z", "2024-01-15T10:30:00Z"),
    ]));

    let err = cell
        .solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap_err();

    let report = err.report().unwrap();
    assert!(!report.is_valid);
    let skill: Vec<_> = report.violations_of(ViolationKind::Skill).collect();
    assert_eq!(skill.len(), 1);
    assert_eq!(skill[0].operator_id, Some(cell.trainee));

    let stored = cell.repo.load_job(&job.id()).await.unwrap();
    assert!(stored.tasks().iter().all(|t| t.planned_start().is_none()));
    assert_eq!(cell.bus.event_count(), published);
}

#[tokio::test]
async fn expired_certification_is_not_accepted() {
    let cell = Cell::new();
    let job = cell.job("WLD-102", "2025-06-30T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![cell.assign(
        &job,
        10,
        cell.certified,
        "2025-03-03T08:00:00Z",
        "2025-03-03T09:15:00Z",
    )]));
    let horizon =
        TimeWindow::absolute(ts("2025-03-03T00:00:00Z"), ts("2025-03-08T00:00:00Z")).unwrap();

    let err = cell
        .solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(SolveScheduleCommand::for_active_jobs(horizon), metadata())
        .await
        .unwrap_err();

    assert!(err.report().unwrap().has_violation(ViolationKind::Skill));
}

#[tokio::test]
async fn late_plan_is_accepted_with_due_date_warning() {
    let cell = Cell::new();
    let job = cell.job("WLD-103", "2024-01-16T10:00:00Z").await;
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![
        cell.assign(&job, 10, cell.certified, "2024-01-16T08:00:00Z", "2024-01-16T09:15:00Z"),
        cell.assign(&job, 20, cell.certified, "2024-01-16T09:15:00Z", "2024-01-16T10:30:00Z"),
    ]));

    let result = cell
        .solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap();

    assert_eq!(result.scheduled_tasks, 2);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::DueDateMissed));
}

#[tokio::test]
async fn adapter_failure_surfaces_as_solver_error() {
    let cell = Cell::new();
    cell.job("WLD-104", "2024-01-19T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_adapter_error("connection reset");

    let err = cell
        .solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap_err();

    assert!(matches!(err, SolveScheduleError::Domain(_)));
    assert!(err.report().is_none());
    assert_eq!(DomainError::from(err).code, ErrorCode::SolverError);
}

#[tokio::test]
async fn infeasible_model_is_reported_without_touching_jobs() {
    let cell = Cell::new();
    let job = cell.job("WLD-110", "2024-01-19T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_failure(SolverFailure::Infeasible);

    let err = cell
        .solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SolveScheduleError::Solver {
            failure: SolverFailure::Infeasible,
            ..
        }
    ));
    assert_eq!(cell.repo.load_job(&job.id()).await.unwrap().version(), 1);
}

// =============================================================================
// Calendar files
// =============================================================================

const PLANT_CALENDAR: &str = r#"
working_hours:
  monday: { start: "06:00", end: "14:00" }
  tuesday: { start: "06:00", end: "14:00" }
  wednesday: { start: "06:00", end: "14:00" }
  thursday: { start: "06:00", end: "14:00" }
  friday: { start: "06:00", end: "12:00" }
holidays:
  - "2024-01-15"
"#;

#[tokio::test]
async fn plan_on_a_file_calendar_holiday_is_rejected_with_hint() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(PLANT_CALENDAR.as_bytes()).unwrap();
    let calendar = FileCalendarLoader::new(file.path())
        .load_calendar()
        .await
        .unwrap();
    assert!(!calendar.is_working_time(&ts("2024-01-15T08:00:00Z")));
    assert!(calendar.is_working_time(&ts("2024-01-16T06:00:00Z")));

    let cell = Cell::new();
    let job = cell.job("WLD-105", "2024-01-19T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![cell.assign(
        &job,
        10,
        cell.certified,
        "2024-01-15T08:00:00Z",
        "2024-01-15T09:15:00Z",
    )]));

    let err = cell
        .solver_handler(solver, calendar)
        .handle(week(), metadata())
        .await
        .unwrap_err();

    let report = err.report().unwrap();
    let calendar_violation = report
        .violations_of(ViolationKind::Calendar)
        .next()
        .unwrap();
    assert_eq!(
        calendar_violation.suggested_start,
        Some(ts("2024-01-16T06:00:00Z"))
    );
}

// =============================================================================
// Analysis
// =============================================================================

#[tokio::test]
async fn refresher_flags_unfinished_tasks_as_critical() {
    let cell = Cell::new();
    let job = cell.job("WLD-106", "2024-01-19T15:00:00Z").await;
    let refresher = CriticalPathRefresher::new(
        cell.repo.clone(),
        cell.bus.clone(),
        cell.clock.clone(),
        metadata(),
    );

    let summary = refresher.refresh_once().await.unwrap();
    assert_eq!(summary.examined, 1);
    assert_eq!(summary.updated, 1);

    let stored = cell.repo.load_job(&job.id()).await.unwrap();
    assert!(stored.tasks().iter().all(|t| t.is_critical_path()));
    assert!(cell.bus.has_event("job.critical_path_updated.v1"));

    let summary = refresher.refresh_once().await.unwrap();
    assert_eq!(summary.updated, 0);
}

#[tokio::test]
async fn refresher_loop_stops_on_shutdown() {
    let cell = Cell::new();
    cell.job("WLD-107", "2024-01-19T15:00:00Z").await;
    let config = CriticalPathRefresherConfig::default().with_interval(StdDuration::from_millis(10));
    let refresher = Arc::new(
        CriticalPathRefresher::new(
            cell.repo.clone(),
            cell.bus.clone(),
            cell.clock.clone(),
            metadata(),
        )
        .with_config(config),
    );
    let (tx, rx) = watch::channel(false);

    let task = {
        let refresher = refresher.clone();
        tokio::spawn(async move { refresher.run(rx).await })
    };
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    tx.send(true).unwrap();

    tokio::time::timeout(StdDuration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert!(cell.bus.has_event("job.critical_path_updated.v1"));
}

#[tokio::test]
async fn overloaded_machine_is_reported_as_bottleneck() {
    let cell = Cell::new();
    let first = cell.job("WLD-108", "2024-01-17T15:00:00Z").await;
    let second = cell.job("WLD-109", "2024-01-16T15:00:00Z").await;
    let solver = MockScheduleSolver::new().with_outcome(SolverOutcome::Solved(vec![
        cell.assign(&first, 10, cell.certified, "2024-01-15T08:00:00Z", "2024-01-15T10:00:00Z"),
        cell.assign(&first, 20, cell.certified, "2024-01-15T10:00:00Z", "2024-01-15T12:00:00Z"),
        cell.assign(&second, 10, cell.certified, "2024-01-15T12:00:00Z", "2024-01-15T14:30:00Z"),
        cell.assign(&second, 20, cell.certified, "2024-01-15T14:30:00Z", "2024-01-15T16:30:00Z"),
    ]));
    cell.solver_handler(solver, BusinessCalendar::standard_calendar())
        .handle(week(), metadata())
        .await
        .unwrap();

    let jobs = cell
        .repo
        .find_by_filters(&JobFilter::new().with_status(JobStatus::Planned))
        .await
        .unwrap();
    let monday =
        TimeWindow::absolute(ts("2024-01-15T00:00:00Z"), ts("2024-01-16T00:00:00Z")).unwrap();
    let bottlenecks = CriticalSequenceManager::default()
        .identify_bottleneck_sequences(
            &jobs,
            &monday,
            &BusinessCalendar::standard_calendar(),
            &cell.resources,
        )
        .unwrap();

    // 510 committed minutes against 540 working minutes
    assert_eq!(bottlenecks.len(), 1);
    assert_eq!(bottlenecks[0].resource, ResourceKey::Machine(cell.welder));
    assert_eq!(bottlenecks[0].utilization_percent, 94);
    assert_eq!(bottlenecks[0].earliest_due_date, ts("2024-01-16T15:00:00Z"));
    assert_eq!(bottlenecks[0].affected_jobs.len(), 2);
}
