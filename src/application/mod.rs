//! Application layer - command handlers and background services.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The domain stays synchronous and clock-free; handlers supply `now` and
//! do the I/O.

pub mod handlers;
pub mod services;

pub use handlers::{
    ChangeJobStatusCommand, ChangeJobStatusHandler, CompleteTaskCommand, CompleteTaskHandler,
    CompleteTaskResult, CreateJobCommand, CreateJobHandler, JobStatusChange, ScheduleTaskCommand,
    ScheduleTaskHandler, SolveScheduleCommand, SolveScheduleError, SolveScheduleHandler,
    SolveScheduleResult, SolveSettings, StartTaskCommand, StartTaskHandler,
};
pub use services::{CriticalPathRefresher, CriticalPathRefresherConfig, RefreshSummary};
