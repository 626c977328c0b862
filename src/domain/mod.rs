//! Domain layer: the scheduling engine's entities, value objects and services.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (value objects, IDs, status machines, errors, events)
//! - `calendar` - Business calendar and its configuration shape
//! - `resources` - Machines, operators, skills and the skill matcher
//! - `job` - The Job aggregate with its tasks and operator assignments
//! - `analysis` - Critical paths, bottlenecks and cost estimation
//! - `validation` - Schedule validation producing violations as data
//! - `planning` - Solver constraint set and solver outcomes
//!
//! Nothing in this layer performs I/O or reads a clock.

pub mod analysis;
pub mod calendar;
pub mod foundation;
pub mod job;
pub mod planning;
pub mod resources;
pub mod validation;
