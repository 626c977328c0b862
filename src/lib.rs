//! Jobshop Core - domain engine for a manufacturing job-shop scheduler.
//!
//! The crate models production jobs and their routed tasks, machines and
//! operators with skill certifications, and the business calendar they
//! work against. On top of that it validates schedules, finds critical
//! paths and bottlenecks, estimates cost, and prepares constraint sets for
//! an external solver whose answers are checked before they are accepted.
//!
//! Layout:
//!
//! - `domain` - aggregates, value objects and pure analyses; no I/O, no clock
//! - `ports` - async traits the application depends on
//! - `adapters` - in-memory and file-backed port implementations
//! - `application` - command handlers and background services
//! - `config` / `telemetry` - environment configuration and tracing setup

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
