//! Foundation module - shared domain primitives.
//!
//! Value objects, identifiers, status state machines, events and error
//! types that form the vocabulary of the job-shop domain.

mod automation_level;
mod command;
mod cost;
mod duration;
mod efficiency_factor;
mod errors;
mod events;
mod ids;
mod job_status;
mod machine_status;
mod operator_status;
mod percentage;
mod priority_level;
mod skill_level;
mod state_machine;
mod task_status;
mod time_window;
mod timestamp;

pub use automation_level::AutomationLevel;
pub use command::CommandMetadata;
pub use cost::{Cost, Currency};
pub use duration::Duration;
pub use efficiency_factor::EfficiencyFactor;
pub use errors::{
    CalendarError, DomainError, ErrorCode, StatusTransitionError, ValidationError,
    ValueObjectError,
};
pub use events::{
    DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{JobId, MachineId, OperationId, OperatorId, TaskId, UserId};
pub use job_status::JobStatus;
pub use machine_status::MachineStatus;
pub use operator_status::OperatorStatus;
pub use percentage::Percentage;
pub use priority_level::PriorityLevel;
pub use skill_level::SkillLevel;
pub use state_machine::StateMachine;
#[cfg(test)]
pub(crate) use state_machine::assert_transition_table;
pub use task_status::TaskStatus;
pub use time_window::{TimeWindow, WindowKind};
pub use timestamp::Timestamp;
