//! TaskStatus enum for tracking the lifecycle of a single operation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Ready,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl TaskStatus {
    /// Returns true if the task holds a planned slot that can be moved.
    pub fn is_reschedulable(&self) -> bool {
        matches!(
            self,
            TaskStatus::Pending | TaskStatus::Ready | TaskStatus::Scheduled
        )
    }

    /// Returns true if the task no longer blocks its successors.
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl StateMachine for TaskStatus {
    const ENTITY: &'static str = "Task";

    fn all() -> &'static [Self] {
        use TaskStatus::*;
        &[
            Pending, Ready, Scheduled, InProgress, Completed, Cancelled, Failed,
        ]
    }

    fn valid_transitions(&self) -> &'static [Self] {
        use TaskStatus::*;
        match self {
            Pending => &[Ready, Scheduled, Cancelled],
            Ready => &[Scheduled, InProgress, Cancelled],
            Scheduled => &[Ready, InProgress, Cancelled],
            InProgress => &[Completed, Failed, Cancelled],
            Failed => &[Ready, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Ready => "READY",
            TaskStatus::Scheduled => "SCHEDULED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::state_machine::{assert_transition_table, assert_transitions_are};

    #[test]
    fn transition_table_is_consistent() {
        assert_transition_table::<TaskStatus>();
    }

    #[test]
    fn failed_reaches_ready_for_rework_or_cancelled() {
        assert_eq!(
            TaskStatus::Failed.valid_transitions(),
            &[TaskStatus::Ready, TaskStatus::Cancelled]
        );
    }

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn pending_cannot_jump_to_completed() {
        assert!(TaskStatus::Pending
            .transition_to(TaskStatus::Completed)
            .is_err());
    }

    #[test]
    fn finished_means_completed_or_cancelled() {
        assert!(TaskStatus::Completed.is_finished());
        assert!(TaskStatus::Cancelled.is_finished());
        assert!(!TaskStatus::Failed.is_finished());
    }

    #[test]
    fn allows_exactly_the_lifecycle_transitions() {
        use TaskStatus::*;
        assert_transitions_are::<TaskStatus>(&[
            (Pending, &[Ready, Scheduled, Cancelled]),
            (Ready, &[Scheduled, InProgress, Cancelled]),
            (Scheduled, &[Ready, InProgress, Cancelled]),
            (InProgress, &[Completed, Failed, Cancelled]),
            (Failed, &[Ready, Cancelled]),
            (Completed, &[]),
            (Cancelled, &[]),
        ]);
    }
}
