//! ScheduleSolver port - the external optimization engine.
//!
//! The solver receives a `ConstraintSet` and answers with assignments or a
//! failure tag. Its output is never trusted: callers validate it with
//! `ScheduleValidator` before anything is persisted.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::planning::{ConstraintSet, SolverOutcome};

/// Port for a constraint-programming scheduler.
///
/// Calls may run for a long time; callers wrap them in a timeout and treat
/// an elapsed timeout like `SolverFailure::Timeout`.
#[async_trait]
pub trait ScheduleSolver: Send + Sync {
    /// Solves the constraint set.
    ///
    /// Infeasibility is a normal outcome, not an error. `Err` is reserved
    /// for transport or adapter failures.
    async fn solve(&self, constraints: &ConstraintSet) -> Result<SolverOutcome, DomainError>;

    /// Solver name for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ScheduleSolver) {}
}
