//! AutomationLevel: how much operator attention a machine needs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationLevel {
    /// An operator is required for the full task duration.
    #[default]
    Attended,
    /// An operator is required for setup only.
    Unattended,
}

impl AutomationLevel {
    /// Share of the run time that occupies an operator.
    pub fn operator_utilization_factor(&self) -> f64 {
        match self {
            AutomationLevel::Attended => 1.0,
            AutomationLevel::Unattended => 0.0,
        }
    }

    /// Whether an operator must stay with the machine while it runs.
    pub fn requires_operator_for_run(&self) -> bool {
        matches!(self, AutomationLevel::Attended)
    }

    /// Operator time consumed by a task: setup is always attended.
    pub fn operator_minutes(&self, setup: &Duration, run: &Duration) -> Duration {
        match self {
            AutomationLevel::Attended => setup.add(run),
            AutomationLevel::Unattended => *setup,
        }
    }
}

impl fmt::Display for AutomationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutomationLevel::Attended => "ATTENDED",
            AutomationLevel::Unattended => "UNATTENDED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attended_consumes_setup_and_run() {
        let setup = Duration::from_minutes(15).unwrap();
        let run = Duration::from_minutes(45).unwrap();
        assert_eq!(
            AutomationLevel::Attended.operator_minutes(&setup, &run),
            Duration::from_minutes(60).unwrap()
        );
        assert_eq!(AutomationLevel::Attended.operator_utilization_factor(), 1.0);
    }

    #[test]
    fn unattended_consumes_setup_only() {
        let setup = Duration::from_minutes(15).unwrap();
        let run = Duration::from_minutes(45).unwrap();
        assert_eq!(AutomationLevel::Unattended.operator_minutes(&setup, &run), setup);
        assert_eq!(AutomationLevel::Unattended.operator_utilization_factor(), 0.0);
        assert!(!AutomationLevel::Unattended.requires_operator_for_run());
    }
}
