//! Adapters - implementations of the ports.
//!
//! - `memory` - In-memory job repository
//! - `events` - In-process event bus
//! - `calendar` - Calendar files (YAML/JSON)
//! - `clock` - System and fixed clocks
//! - `mock_solver` - Scripted schedule solver

pub mod calendar;
pub mod clock;
pub mod events;
pub mod memory;
pub mod mock_solver;

pub use calendar::FileCalendarLoader;
pub use clock::{FixedClock, SystemClock};
pub use events::InMemoryEventBus;
pub use memory::InMemoryJobRepository;
pub use mock_solver::MockScheduleSolver;
