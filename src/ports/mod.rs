//! Ports - interfaces between the scheduling core and the outside world.
//!
//! Following hexagonal architecture, ports define the contracts; adapters
//! implement them.
//!
//! - `JobRepository` - Job aggregate persistence with optimistic versioning
//! - `ScheduleSolver` - External constraint solver
//! - `EventPublisher` / `EventSubscriber` / `EventHandler` - Domain event delivery
//! - `CalendarSource` - Business calendar loading
//! - `Clock` - Current time for application handlers

mod calendar_source;
mod clock;
mod event_publisher;
mod event_subscriber;
mod job_repository;
mod schedule_solver;

pub use calendar_source::CalendarSource;
pub use clock::Clock;
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use job_repository::{JobFilter, JobRepository};
pub use schedule_solver::ScheduleSolver;
