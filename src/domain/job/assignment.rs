use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, OperatorId, TimeWindow, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentType {
    /// Operator is needed while the machine is set up.
    SetupOnly,
    /// Operator stays for setup and the whole run.
    FullDuration,
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignmentType::SetupOnly => "SETUP_ONLY",
            AssignmentType::FullDuration => "FULL_DURATION",
        };
        write!(f, "{}", s)
    }
}

/// An operator booked onto a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAssignment {
    operator_id: OperatorId,
    assignment_type: AssignmentType,
    planned_start: Option<Timestamp>,
    planned_end: Option<Timestamp>,
    actual_start: Option<Timestamp>,
    actual_end: Option<Timestamp>,
}

impl OperatorAssignment {
    /// Books an operator; the planned window, when given, must have end after start.
    pub fn new(
        operator_id: OperatorId,
        assignment_type: AssignmentType,
        planned: Option<(Timestamp, Timestamp)>,
    ) -> Result<Self, DomainError> {
        if let Some((start, end)) = planned {
            if end <= start {
                return Err(DomainError::business_rule(
                    "assignment_window",
                    format!("Assignment must end after it starts ({} >= {})", start, end),
                )
                .with_detail("operator_id", operator_id.to_string()));
            }
        }
        Ok(Self {
            operator_id,
            assignment_type,
            planned_start: planned.map(|(s, _)| s),
            planned_end: planned.map(|(_, e)| e),
            actual_start: None,
            actual_end: None,
        })
    }

    pub fn operator_id(&self) -> OperatorId {
        self.operator_id
    }

    pub fn assignment_type(&self) -> AssignmentType {
        self.assignment_type
    }

    pub fn planned_window(&self) -> Option<TimeWindow> {
        match (self.planned_start, self.planned_end) {
            (Some(start), Some(end)) => TimeWindow::absolute(start, end).ok(),
            _ => None,
        }
    }

    pub fn actual_start(&self) -> Option<Timestamp> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<Timestamp> {
        self.actual_end
    }

    pub fn is_started(&self) -> bool {
        self.actual_start.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.actual_end.is_some()
    }

    pub(crate) fn start(&mut self, at: Timestamp) -> Result<(), DomainError> {
        if self.is_started() {
            return Err(self.rule("assignment_already_started", "Assignment has already started"));
        }
        self.actual_start = Some(at);
        Ok(())
    }

    pub(crate) fn complete(&mut self, at: Timestamp) -> Result<(), DomainError> {
        let Some(started) = self.actual_start else {
            return Err(self.rule(
                "assignment_not_started",
                "Assignment cannot be completed before it starts",
            ));
        };
        if self.is_completed() {
            return Err(self.rule("assignment_already_completed", "Assignment is already complete"));
        }
        if at <= started {
            return Err(self
                .rule("assignment_window", "Assignment completion must follow its start")
                .with_detail("actual_start", started.to_string())
                .with_detail("actual_end", at.to_string()));
        }
        self.actual_end = Some(at);
        Ok(())
    }

    pub(crate) fn check_invariants(&self) -> Result<(), DomainError> {
        if self.actual_end.is_some() && self.actual_start.is_none() {
            return Err(self.rule("assignment_not_started", "Completed assignment has no start"));
        }
        if let (Some(start), Some(end)) = (self.actual_start, self.actual_end) {
            if end <= start {
                return Err(self.rule("assignment_window", "Assignment ends before it starts"));
            }
        }
        Ok(())
    }

    fn rule(&self, rule: &str, message: &str) -> DomainError {
        DomainError::business_rule(rule, message)
            .with_detail("operator_id", self.operator_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn assignment() -> OperatorAssignment {
        OperatorAssignment::new(OperatorId::new(), AssignmentType::FullDuration, None).unwrap()
    }

    #[test]
    fn cannot_complete_before_starting() {
        let mut a = assignment();
        let err = a.complete(ts("2024-03-04T10:00:00Z")).unwrap_err();
        assert_eq!(err.detail("rule"), Some("assignment_not_started"));
    }

    #[test]
    fn completion_must_follow_start() {
        let mut a = assignment();
        a.start(ts("2024-03-04T10:00:00Z")).unwrap();
        assert!(a.complete(ts("2024-03-04T10:00:00Z")).is_err());
        a.complete(ts("2024-03-04T11:00:00Z")).unwrap();
        assert!(a.is_completed());
    }

    #[test]
    fn planned_window_must_be_positive() {
        let result = OperatorAssignment::new(
            OperatorId::new(),
            AssignmentType::SetupOnly,
            Some((ts("2024-03-04T10:00:00Z"), ts("2024-03-04T09:00:00Z"))),
        );
        assert!(result.unwrap_err().is_business_rule_violation());
    }
}
