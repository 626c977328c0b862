//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bottleneck threshold must be between 1 and 100 percent, got {0}")]
    InvalidBottleneckThreshold(u32),

    #[error("Due-date warning percentage must be at most 100, got {0}")]
    InvalidDueDateWarning(u32),

    #[error("Calendar search horizon must be between 1 and 366 days, got {0}")]
    InvalidSearchHorizon(u32),

    #[error("Solver timeout must be between 1 and 3600 seconds, got {0}")]
    InvalidSolverTimeout(u64),

    #[error("Critical path refresh interval must be at least 1 second")]
    InvalidRefreshInterval,

    #[error("Calendar file must end in .yaml, .yml or .json: {0}")]
    InvalidCalendarPath(String),

    #[error("Invalid log filter directive: {0}")]
    InvalidLogLevel(String),
}
