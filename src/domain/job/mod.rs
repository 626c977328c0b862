//! Job aggregate, its tasks, operator assignments and events.

mod aggregate;
mod assignment;
mod events;
mod task;

pub use aggregate::{Job, JobState, NewJob};
pub use assignment::{AssignmentType, OperatorAssignment};
pub use events::{JobEvent, JobEventKind};
pub use task::{MachineOption, NewTask, Task, MAX_SEQUENCE, MIN_SEQUENCE};
