//! Scripted schedule solver for tests and demos.
//!
//! Returns pre-configured outcomes in order, optionally after a delay so
//! that timeout handling can be exercised.
//!
//! ```ignore
//! let solver = MockScheduleSolver::new()
//!     .with_outcome(SolverOutcome::Solved(assignments))
//!     .with_delay(Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::{DomainError, ErrorCode, TaskId};
use crate::domain::planning::{ConstraintSet, SolverFailure, SolverOutcome};
use crate::ports::ScheduleSolver;

/// A configured mock response.
#[derive(Debug, Clone)]
enum Scripted {
    Outcome(SolverOutcome),
    AdapterError(String),
}

#[derive(Debug, Clone, Default)]
pub struct MockScheduleSolver {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    delay: Duration,
    /// Task ids of every constraint set received.
    calls: Arc<Mutex<Vec<Vec<TaskId>>>>,
}

impl MockScheduleSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(self, outcome: SolverOutcome) -> Self {
        self.push(Scripted::Outcome(outcome));
        self
    }

    pub fn with_failure(self, failure: SolverFailure) -> Self {
        self.with_outcome(SolverOutcome::Failed(failure))
    }

    /// Makes the next call fail at the transport level (`Err`, not an outcome).
    pub fn with_adapter_error(self, message: impl Into<String>) -> Self {
        self.push(Scripted::AdapterError(message.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Task ids of the constraint set passed on each call, in call order.
    pub fn received_tasks(&self) -> Vec<Vec<TaskId>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, scripted: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(scripted);
    }
}

#[async_trait]
impl ScheduleSolver for MockScheduleSolver {
    async fn solve(&self, constraints: &ConstraintSet) -> Result<SolverOutcome, DomainError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(constraints.tasks.iter().map(|t| t.task_id).collect());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Scripted::Outcome(outcome)) => Ok(outcome),
            Some(Scripted::AdapterError(message)) => {
                Err(DomainError::new(ErrorCode::SolverError, message))
            }
            None => Ok(SolverOutcome::Failed(SolverFailure::Error(
                "no scripted outcome left".to_string(),
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
