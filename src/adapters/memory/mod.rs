//! In-memory persistence adapters for tests and embedded use.

mod in_memory_job_repository;

pub use in_memory_job_repository::InMemoryJobRepository;
