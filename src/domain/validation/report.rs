//! Validation results. Problems are returned as data, never raised.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{MachineId, OperatorId, TaskId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Precedence,
    Calendar,
    MachineConflict,
    OperatorConflict,
    Skill,
    UnknownResource,
}

/// A hard problem: the schedule must not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub task_ids: Vec<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<MachineId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<OperatorId>,
    /// Earliest instant that would satisfy a calendar violation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_start: Option<Timestamp>,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>, task_ids: Vec<TaskId>) -> Self {
        Self {
            kind,
            message: message.into(),
            task_ids,
            machine_id: None,
            operator_id: None,
            suggested_start: None,
        }
    }

    pub fn with_machine(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    pub fn with_operator(mut self, operator_id: OperatorId) -> Self {
        self.operator_id = Some(operator_id);
        self
    }

    pub fn with_suggested_start(mut self, at: Timestamp) -> Self {
        self.suggested_start = Some(at);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DueDateRisk,
    DueDateMissed,
    UnscheduledTask,
    MachineUnavailable,
}

/// A soft problem worth reporting; never invalidates a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
    pub task_ids: Vec<TaskId>,
}

impl ValidationWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>, task_ids: Vec<TaskId>) -> Self {
        Self {
            kind,
            message: message.into(),
            task_ids,
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Everything found while validating one job's schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: violations.is_empty(),
            violations,
            warnings,
        }
    }

    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.violations_of(kind).next().is_some()
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Violation messages, for callers that only need text.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    /// Folds another report into this one.
    pub fn merge(mut self, other: ValidationReport) -> Self {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
        self.is_valid = self.violations.is_empty();
        self
    }
}
