//! JobStatus enum for tracking the lifecycle of production jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Planned,
    Released,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl JobStatus {
    /// Returns true if tasks may still be added or changed.
    pub fn is_mutable(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true once the job has reached the shop floor.
    pub fn is_in_production(&self) -> bool {
        matches!(self, JobStatus::InProgress | JobStatus::Completed)
    }

    /// Returns true if work may be started on the job's tasks.
    pub fn accepts_work(&self) -> bool {
        matches!(self, JobStatus::Released | JobStatus::InProgress)
    }
}

impl StateMachine for JobStatus {
    const ENTITY: &'static str = "Job";

    fn all() -> &'static [Self] {
        use JobStatus::*;
        &[Planned, Released, InProgress, Completed, OnHold, Cancelled]
    }

    fn valid_transitions(&self) -> &'static [Self] {
        use JobStatus::*;
        match self {
            Planned => &[Released, OnHold, Cancelled],
            Released => &[InProgress, OnHold, Cancelled],
            InProgress => &[Completed, OnHold, Cancelled],
            OnHold => &[Released, Cancelled],
            Completed | Cancelled => &[],
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Planned => "PLANNED",
            JobStatus::Released => "RELEASED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::OnHold => "ON_HOLD",
            JobStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}
