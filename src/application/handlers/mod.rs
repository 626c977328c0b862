//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through the ports.

pub mod job;

pub use job::{
    ChangeJobStatusCommand, ChangeJobStatusHandler, CompleteTaskCommand, CompleteTaskHandler,
    CompleteTaskResult, CreateJobCommand, CreateJobHandler, JobStatusChange, ScheduleTaskCommand,
    ScheduleTaskHandler, SolveScheduleCommand, SolveScheduleError, SolveScheduleHandler,
    SolveScheduleResult, SolveSettings, StartTaskCommand, StartTaskHandler,
};
