//! Solver boundary: what goes out to the optimizer and what comes back.

mod constraint_set;
mod solution;

pub use constraint_set::{
    ConstraintSet, DurationOption, ExcludedTask, OperatorCandidate, PrecedenceEdge, TaskConstraint,
};
pub use solution::{
    apply_assignments, group_by_job, SolverAssignment, SolverFailure, SolverOutcome,
};
