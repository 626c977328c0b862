//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state transitions
//! across the Job, Task, Machine and Operator lifecycles.

use std::fmt;

use super::StatusTransitionError;

/// Trait for status enums that represent state machines.
///
/// Implementors publish a static transition table through
/// `valid_transitions` and get validated transition methods for free.
/// There is no implicit or default transition.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for TaskStatus {
///     const ENTITY: &'static str = "Task";
///
///     fn all() -> &'static [Self] { &[Pending, Ready, /* ... */] }
///
///     fn valid_transitions(&self) -> &'static [Self] {
///         match self {
///             Pending => &[Ready, Scheduled, Cancelled],
///             // ... etc
///         }
///     }
/// }
///
/// // Usage:
/// let new_status = current_status.transition_to(TaskStatus::Ready)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug + fmt::Display + 'static {
    /// Entity name reported in transition errors (e.g. "Job").
    const ENTITY: &'static str;

    /// Every state of the machine, in declaration order.
    fn all() -> &'static [Self];

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> &'static [Self];

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(StatusTransitionError::new(Self::ENTITY, self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

/// Exhaustively checks a transition table: every pair listed succeeds and
/// every other pair fails with a `StatusTransitionError` naming both states.
#[cfg(test)]
pub(crate) fn assert_transition_table<S: StateMachine>() {
    for from in S::all() {
        for to in S::all() {
            let listed = from.valid_transitions().contains(to);
            assert_eq!(
                from.can_transition_to(to),
                listed,
                "can_transition_to disagrees with table for {:?} -> {:?}",
                from,
                to
            );
            match from.transition_to(*to) {
                Ok(next) => {
                    assert!(listed, "{:?} -> {:?} should have failed", from, to);
                    assert_eq!(next, *to);
                }
                Err(err) => {
                    assert!(!listed, "{:?} -> {:?} should have succeeded", from, to);
                    assert_eq!(err.entity, S::ENTITY);
                    assert_eq!(err.from, from.to_string());
                    assert_eq!(err.to, to.to_string());
                }
            }
        }
    }
}

/// Checks the machine allows exactly the listed transitions. `expected`
/// must name every state once; states with no row target are terminal.
#[cfg(test)]
pub(crate) fn assert_transitions_are<S: StateMachine>(expected: &[(S, &[S])]) {
    assert_eq!(expected.len(), S::all().len(), "every state needs a row");
    for from in S::all() {
        let allowed = expected
            .iter()
            .find(|(state, _)| state == from)
            .map(|(_, targets)| *targets)
            .unwrap_or_else(|| panic!("no row for {:?}", from));
        for to in S::all() {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(to),
                "{:?} -> {:?}",
                from,
                to
            );
        }
        assert_eq!(from.is_terminal(), allowed.is_empty(), "{:?} terminal", from);
    }
}
