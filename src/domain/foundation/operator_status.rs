//! OperatorStatus enum for operator presence and assignment.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Presence status of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorStatus {
    #[default]
    Available,
    Assigned,
    OnBreak,
    OffShift,
    Absent,
}

impl OperatorStatus {
    /// Returns true if the operator is on site and can take an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(self, OperatorStatus::Available | OperatorStatus::Assigned)
    }
}

impl StateMachine for OperatorStatus {
    const ENTITY: &'static str = "Operator";

    fn all() -> &'static [Self] {
        use OperatorStatus::*;
        &[Available, Assigned, OnBreak, OffShift, Absent]
    }

    fn valid_transitions(&self) -> &'static [Self] {
        use OperatorStatus::*;
        match self {
            Available => &[Assigned, OnBreak, OffShift, Absent],
            Assigned => &[Available, OnBreak, OffShift],
            OnBreak => &[Available, Assigned, OffShift],
            OffShift => &[Available, Absent],
            Absent => &[Available, OffShift],
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperatorStatus::Available => "AVAILABLE",
            OperatorStatus::Assigned => "ASSIGNED",
            OperatorStatus::OnBreak => "ON_BREAK",
            OperatorStatus::OffShift => "OFF_SHIFT",
            OperatorStatus::Absent => "ABSENT",
        };
        write!(f, "{}", s)
    }
}
