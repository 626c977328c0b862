//! Schedule validation: every constraint a planned schedule must satisfy.
//!
//! Solver output and manual plans go through the same `ScheduleValidator`;
//! nothing is accepted with a non-empty violation list.

mod report;
mod schedule_validator;

pub use report::{ValidationReport, ValidationWarning, Violation, ViolationKind, WarningKind};
pub use schedule_validator::{
    Booking, ScheduleContext, ScheduleValidator, DEFAULT_DUE_DATE_WARNING_PERCENT,
};
