//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

use super::Timestamp;

/// Field-level errors raised while constructing entities and value objects.
///
/// Recoverable: the caller should correct the input and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Field '{field}' must be in the future, got {value}")]
    NotInFuture { field: String, value: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a "must be in the future" validation error.
    pub fn not_in_future(field: impl Into<String>, value: impl fmt::Display) -> Self {
        ValidationError::NotInFuture {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotInFuture { field, .. } => field,
        }
    }
}

/// An illegal lifecycle transition.
///
/// A specialization of a business-rule violation that carries the entity
/// kind plus the source and target states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot transition from {from} to {to}")]
pub struct StatusTransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

impl StatusTransitionError {
    pub fn new(entity: &'static str, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Misuse of value-object arithmetic.
///
/// These indicate a programming error at the call site and are always fatal
/// to the operation that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Duration cannot become negative in {operation}: {minutes} minutes")]
    NegativeDuration {
        operation: &'static str,
        minutes: String,
    },

    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("Cannot combine a {left} time window with a {right} time window")]
    IncompatibleWindowKind {
        left: &'static str,
        right: &'static str,
    },

    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    #[error("Cost cannot become negative in {operation}: {amount}")]
    NegativeCost {
        operation: &'static str,
        amount: String,
    },
}

/// Calendar configuration and search failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("No working time found within {horizon_days} days after {from}")]
    NoWorkingTimeFound { from: Timestamp, horizon_days: u32 },
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,
    NotInFuture,

    // Not found errors
    JobNotFound,
    TaskNotFound,
    MachineNotFound,
    OperatorNotFound,

    // Business rule errors
    BusinessRuleViolation,
    InvalidStateTransition,
    JobTerminal,
    DuplicateSequence,
    DuplicateAssignment,
    DuplicateJobNumber,

    // Value object misuse
    NegativeDuration,
    CurrencyMismatch,
    IncompatibleWindowKind,
    DivisionByZero,
    NegativeCost,

    // Calendar errors
    NoWorkingTimeFound,

    // Solver errors
    SolverInfeasible,
    SolverTimeout,
    SolverError,
    ScheduleRejected,

    // Infrastructure errors
    ConcurrencyConflict,
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::NotInFuture => "NOT_IN_FUTURE",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::MachineNotFound => "MACHINE_NOT_FOUND",
            ErrorCode::OperatorNotFound => "OPERATOR_NOT_FOUND",
            ErrorCode::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::JobTerminal => "JOB_TERMINAL",
            ErrorCode::DuplicateSequence => "DUPLICATE_SEQUENCE",
            ErrorCode::DuplicateAssignment => "DUPLICATE_ASSIGNMENT",
            ErrorCode::DuplicateJobNumber => "DUPLICATE_JOB_NUMBER",
            ErrorCode::NegativeDuration => "NEGATIVE_DURATION",
            ErrorCode::CurrencyMismatch => "CURRENCY_MISMATCH",
            ErrorCode::IncompatibleWindowKind => "INCOMPATIBLE_WINDOW_KIND",
            ErrorCode::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorCode::NegativeCost => "NEGATIVE_COST",
            ErrorCode::NoWorkingTimeFound => "NO_WORKING_TIME_FOUND",
            ErrorCode::SolverInfeasible => "SOLVER_INFEASIBLE",
            ErrorCode::SolverTimeout => "SOLVER_TIMEOUT",
            ErrorCode::SolverError => "SOLVER_ERROR",
            ErrorCode::ScheduleRejected => "SCHEDULE_REJECTED",
            ErrorCode::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and structured details.
///
/// Details carry the machine-actionable context (field name, offending value,
/// from/to state) that the API boundary maps onto its responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Creates a business-rule violation naming the broken rule.
    pub fn business_rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BusinessRuleViolation, message).with_detail("rule", rule.into())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns a detail value by key.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    /// True for domain invariants broken by an otherwise well-formed request,
    /// including illegal status transitions.
    pub fn is_business_rule_violation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::BusinessRuleViolation
                | ErrorCode::InvalidStateTransition
                | ErrorCode::JobTerminal
                | ErrorCode::DuplicateSequence
                | ErrorCode::DuplicateAssignment
                | ErrorCode::DuplicateJobNumber
        )
    }

    /// True for field-level validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationFailed
                | ErrorCode::EmptyField
                | ErrorCode::OutOfRange
                | ErrorCode::InvalidFormat
                | ErrorCode::NotInFuture
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        let field = err.field().to_string();
        match err {
            ValidationError::EmptyField { .. } => {
                DomainError::new(ErrorCode::EmptyField, message).with_detail("field", field)
            }
            ValidationError::OutOfRange {
                min, max, actual, ..
            } => DomainError::new(ErrorCode::OutOfRange, message)
                .with_detail("field", field)
                .with_detail("min", min.to_string())
                .with_detail("max", max.to_string())
                .with_detail("value", actual.to_string()),
            ValidationError::InvalidFormat { reason, .. } => {
                DomainError::new(ErrorCode::InvalidFormat, message)
                    .with_detail("field", field)
                    .with_detail("reason", reason)
            }
            ValidationError::NotInFuture { value, .. } => {
                DomainError::new(ErrorCode::NotInFuture, message)
                    .with_detail("field", field)
                    .with_detail("value", value)
            }
        }
    }
}

impl From<StatusTransitionError> for DomainError {
    fn from(err: StatusTransitionError) -> Self {
        DomainError::new(ErrorCode::InvalidStateTransition, err.to_string())
            .with_detail("entity", err.entity)
            .with_detail("from", err.from)
            .with_detail("to", err.to)
    }
}

impl From<ValueObjectError> for DomainError {
    fn from(err: ValueObjectError) -> Self {
        let message = err.to_string();
        match err {
            ValueObjectError::NegativeDuration { operation, minutes } => {
                DomainError::new(ErrorCode::NegativeDuration, message)
                    .with_detail("operation", operation)
                    .with_detail("value", minutes)
            }
            ValueObjectError::CurrencyMismatch { left, right } => {
                DomainError::new(ErrorCode::CurrencyMismatch, message)
                    .with_detail("left", left)
                    .with_detail("right", right)
            }
            ValueObjectError::IncompatibleWindowKind { left, right } => {
                DomainError::new(ErrorCode::IncompatibleWindowKind, message)
                    .with_detail("left", left)
                    .with_detail("right", right)
            }
            ValueObjectError::DivisionByZero { operation } => {
                DomainError::new(ErrorCode::DivisionByZero, message)
                    .with_detail("operation", operation)
            }
            ValueObjectError::NegativeCost { operation, amount } => {
                DomainError::new(ErrorCode::NegativeCost, message)
                    .with_detail("operation", operation)
                    .with_detail("value", amount)
            }
        }
    }
}

impl From<CalendarError> for DomainError {
    fn from(err: CalendarError) -> Self {
        let message = err.to_string();
        match err {
            CalendarError::NoWorkingTimeFound { from, horizon_days } => {
                DomainError::new(ErrorCode::NoWorkingTimeFound, message)
                    .with_detail("from", from.to_string())
                    .with_detail("horizon_days", horizon_days.to_string())
            }
        }
    }
}
