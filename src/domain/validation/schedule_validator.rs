//! Aggregate constraint checker for a job's planned schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ValidationReport, ValidationWarning, Violation, ViolationKind, WarningKind};
use crate::domain::calendar::BusinessCalendar;
use crate::domain::foundation::{
    JobId, MachineId, OperatorId, TaskId, TaskStatus, TimeWindow, Timestamp,
};
use crate::domain::job::{Job, Task};
use crate::domain::resources::{ResourcePool, SkillMatcher};

/// Default share of the job window below which a due date is at risk.
pub const DEFAULT_DUE_DATE_WARNING_PERCENT: u32 = 10;

/// A resource reservation held by some task, used for cross-job conflict checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub machine_id: Option<MachineId>,
    pub operator_ids: Vec<OperatorId>,
    pub window: TimeWindow,
}

impl Booking {
    /// Bookings for every scheduled, unfinished or completed task of a job.
    pub fn from_job(job: &Job) -> Vec<Booking> {
        job.tasks()
            .iter()
            .filter(|t| t.status() != TaskStatus::Cancelled)
            .filter_map(|task| {
                Some(Booking {
                    job_id: job.id(),
                    task_id: task.id(),
                    machine_id: task.assigned_machine_id(),
                    operator_ids: task
                        .operator_assignments()
                        .iter()
                        .map(|a| a.operator_id())
                        .collect(),
                    window: task.planned_window()?,
                })
            })
            .collect()
    }
}

/// Everything outside the job that validation depends on.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleContext<'a> {
    pub calendar: &'a BusinessCalendar,
    pub resources: &'a ResourcePool,
    /// Reservations held by other jobs. Entries of the validated job are ignored.
    pub bookings: &'a [Booking],
    /// Fallback date for certification checks on unscheduled tasks.
    pub as_of: NaiveDate,
}

/// Checks precedence, calendar, resource and skill constraints of one job.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleValidator {
    due_date_warning_percent: u32,
    matcher: SkillMatcher,
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_DUE_DATE_WARNING_PERCENT)
    }
}

impl ScheduleValidator {
    pub fn new(due_date_warning_percent: u32) -> Self {
        Self {
            due_date_warning_percent,
            matcher: SkillMatcher::new(),
        }
    }

    /// Runs every check and collects all problems found.
    ///
    /// Order: precedence, calendar, resource conflicts, skills, then warnings.
    pub fn validate_complete(&self, job: &Job, ctx: &ScheduleContext<'_>) -> ValidationReport {
        let live: Vec<&Task> = job
            .tasks()
            .iter()
            .filter(|t| t.status() != TaskStatus::Cancelled)
            .collect();

        let mut violations = Vec::new();
        self.check_precedence(&live, &mut violations);
        self.check_calendar(&live, ctx.calendar, &mut violations);
        self.check_machine_conflicts(job.id(), &live, ctx, &mut violations);
        self.check_operator_conflicts(job.id(), &live, ctx, &mut violations);
        self.check_skills(&live, ctx, &mut violations);

        let mut warnings = Vec::new();
        self.check_unscheduled(&live, &mut warnings);
        self.check_machine_availability(&live, ctx.resources, &mut violations, &mut warnings);
        self.check_due_date(job, &live, &mut warnings);

        tracing::debug!(
            job_id = %job.id(),
            violations = violations.len(),
            warnings = warnings.len(),
            "schedule validated"
        );
        ValidationReport::new(violations, warnings)
    }

    fn check_precedence(&self, tasks: &[&Task], out: &mut Vec<Violation>) {
        let scheduled: Vec<(&Task, Timestamp, Timestamp)> = tasks
            .iter()
            .filter_map(|t| Some((*t, t.planned_start()?, t.planned_end()?)))
            .collect();
        for pair in scheduled.windows(2) {
            let (before, _, before_end) = pair[0];
            let (after, after_start, _) = pair[1];
            if after_start < before_end {
                out.push(Violation::new(
                    ViolationKind::Precedence,
                    format!(
                        "Task {} starts at {} before task {} ends at {}",
                        after.sequence_in_job(),
                        after_start,
                        before.sequence_in_job(),
                        before_end
                    ),
                    vec![before.id(), after.id()],
                ));
            }
        }
    }

    fn check_calendar(&self, tasks: &[&Task], calendar: &BusinessCalendar, out: &mut Vec<Violation>) {
        for task in tasks {
            let (Some(start), Some(end)) = (task.planned_start(), task.planned_end()) else {
                continue;
            };
            for (label, instant) in [("start", start), ("end", end)] {
                if calendar.is_working_time(&instant) {
                    continue;
                }
                let mut violation = Violation::new(
                    ViolationKind::Calendar,
                    format!(
                        "Task {} planned {} {} is outside working time",
                        task.sequence_in_job(),
                        label,
                        instant
                    ),
                    vec![task.id()],
                );
                if let Ok(next) = calendar.next_working_time(&instant) {
                    violation = violation.with_suggested_start(next);
                }
                out.push(violation);
            }
        }
    }

    fn check_machine_conflicts(
        &self,
        job_id: JobId,
        tasks: &[&Task],
        ctx: &ScheduleContext<'_>,
        out: &mut Vec<Violation>,
    ) {
        let mine: Vec<(TaskId, MachineId, TimeWindow)> = tasks
            .iter()
            .filter_map(|t| Some((t.id(), t.assigned_machine_id()?, t.planned_window()?)))
            .collect();

        for (i, (task_a, machine_a, window_a)) in mine.iter().enumerate() {
            for (task_b, machine_b, window_b) in &mine[i + 1..] {
                if machine_a == machine_b && overlaps(window_a, window_b) {
                    out.push(
                        Violation::new(
                            ViolationKind::MachineConflict,
                            format!("Machine {} is double-booked within the job", machine_a),
                            vec![*task_a, *task_b],
                        )
                        .with_machine(*machine_a),
                    );
                }
            }
            for booking in ctx.bookings.iter().filter(|b| b.job_id != job_id) {
                if booking.machine_id == Some(*machine_a) && overlaps(window_a, &booking.window) {
                    out.push(
                        Violation::new(
                            ViolationKind::MachineConflict,
                            format!(
                                "Machine {} is already booked by job {}",
                                machine_a, booking.job_id
                            ),
                            vec![*task_a, booking.task_id],
                        )
                        .with_machine(*machine_a),
                    );
                }
            }
        }
    }

    fn check_operator_conflicts(
        &self,
        job_id: JobId,
        tasks: &[&Task],
        ctx: &ScheduleContext<'_>,
        out: &mut Vec<Violation>,
    ) {
        let mine: Vec<(TaskId, OperatorId, TimeWindow)> = tasks
            .iter()
            .flat_map(|task| {
                task.operator_assignments().iter().filter_map(move |a| {
                    Some((task.id(), a.operator_id(), task.assignment_window(a)?))
                })
            })
            .collect();

        for (i, (task_a, operator_a, window_a)) in mine.iter().enumerate() {
            for (task_b, operator_b, window_b) in &mine[i + 1..] {
                if operator_a == operator_b && overlaps(window_a, window_b) {
                    out.push(
                        Violation::new(
                            ViolationKind::OperatorConflict,
                            format!("Operator {} has overlapping assignments", operator_a),
                            vec![*task_a, *task_b],
                        )
                        .with_operator(*operator_a),
                    );
                }
            }
            for booking in ctx.bookings.iter().filter(|b| b.job_id != job_id) {
                if booking.operator_ids.contains(operator_a) && overlaps(window_a, &booking.window) {
                    out.push(
                        Violation::new(
                            ViolationKind::OperatorConflict,
                            format!(
                                "Operator {} is already assigned to job {}",
                                operator_a, booking.job_id
                            ),
                            vec![*task_a, booking.task_id],
                        )
                        .with_operator(*operator_a),
                    );
                }
            }
        }
    }

    /// Every assigned operator must hold the task's skills plus those the
    /// assigned machine demands, valid on the planned start date.
    fn check_skills(&self, tasks: &[&Task], ctx: &ScheduleContext<'_>, out: &mut Vec<Violation>) {
        for task in tasks {
            let machine = task
                .assigned_machine_id()
                .and_then(|id| ctx.resources.machine(&id));
            let requirements = match machine {
                Some(m) => task.skill_requirements().merged_with(&m.skill_requirements),
                None => task.skill_requirements().clone(),
            };
            let as_of = task.planned_start().map_or(ctx.as_of, |s| s.date());

            for assignment in task.operator_assignments() {
                let operator_id = assignment.operator_id();
                let Some(operator) = ctx.resources.operator(&operator_id) else {
                    out.push(
                        Violation::new(
                            ViolationKind::UnknownResource,
                            format!("Operator {} is not in the resource pool", operator_id),
                            vec![task.id()],
                        )
                        .with_operator(operator_id),
                    );
                    continue;
                };
                if requirements.is_empty() {
                    continue;
                }
                let gaps = self.matcher.qualification_gaps(operator, &requirements, as_of);
                if gaps.is_empty() {
                    continue;
                }
                let detail: Vec<String> = gaps
                    .iter()
                    .map(|g| match (g.held, g.expired) {
                        (Some(_), true) => format!("{} expired", g.skill),
                        (Some(held), false) => format!("{} {} < {}", g.skill, held, g.required),
                        (None, _) => format!("{} missing", g.skill),
                    })
                    .collect();
                out.push(
                    Violation::new(
                        ViolationKind::Skill,
                        format!(
                            "Operator {} is not qualified for task {}: {}",
                            operator.name,
                            task.sequence_in_job(),
                            detail.join(", ")
                        ),
                        vec![task.id()],
                    )
                    .with_operator(operator_id),
                );
            }
        }
    }

    fn check_unscheduled(&self, tasks: &[&Task], out: &mut Vec<ValidationWarning>) {
        let unscheduled: Vec<TaskId> = tasks
            .iter()
            .filter(|t| !t.status().is_finished() && !t.is_scheduled())
            .map(|t| t.id())
            .collect();
        if !unscheduled.is_empty() {
            out.push(ValidationWarning::new(
                WarningKind::UnscheduledTask,
                format!("{} task(s) have no planned window", unscheduled.len()),
                unscheduled,
            ));
        }
    }

    fn check_machine_availability(
        &self,
        tasks: &[&Task],
        resources: &ResourcePool,
        violations: &mut Vec<Violation>,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        for task in tasks.iter().filter(|t| !t.status().is_finished()) {
            let Some(machine_id) = task.assigned_machine_id() else {
                continue;
            };
            match resources.machine(&machine_id) {
                None => violations.push(
                    Violation::new(
                        ViolationKind::UnknownResource,
                        format!("Machine {} is not in the resource pool", machine_id),
                        vec![task.id()],
                    )
                    .with_machine(machine_id),
                ),
                Some(machine) if !machine.can_accept_work() => warnings.push(ValidationWarning::new(
                    WarningKind::MachineUnavailable,
                    format!(
                        "Machine {} is {} but task {} is planned on it",
                        machine.name,
                        machine.status,
                        task.sequence_in_job()
                    ),
                    vec![task.id()],
                )),
                Some(_) => {}
            }
        }
    }

    /// Warns when the last planned end misses the due date, or leaves less
    /// than the configured share of the job window as buffer.
    fn check_due_date(&self, job: &Job, tasks: &[&Task], out: &mut Vec<ValidationWarning>) {
        let Some(last) = tasks.iter().filter_map(|t| t.planned_end()).max() else {
            return;
        };
        let due = job.due_date();
        let ids: Vec<TaskId> = tasks
            .iter()
            .filter(|t| t.planned_end() == Some(last))
            .map(|t| t.id())
            .collect();
        if last > due {
            out.push(ValidationWarning::new(
                WarningKind::DueDateMissed,
                format!(
                    "Job {} finishes {} minutes after its due date",
                    job.job_number(),
                    last.minutes_since(&due)
                ),
                ids,
            ));
            return;
        }
        let (start, _) = job.job_window();
        let window = due.minutes_since(&start);
        let buffer = due.minutes_since(&last);
        if window > 0 && buffer * 100 < window * i64::from(self.due_date_warning_percent) {
            out.push(ValidationWarning::new(
                WarningKind::DueDateRisk,
                format!(
                    "Job {} finishes only {} minutes before its due date",
                    job.job_number(),
                    buffer
                ),
                ids,
            ));
        }
    }
}

fn overlaps(a: &TimeWindow, b: &TimeWindow) -> bool {
    a.overlaps_with(b).unwrap_or(false)
}
