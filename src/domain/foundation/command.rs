//! Command metadata carried through application handlers.
//!
//! Handlers accept one `CommandMetadata` instead of separate user, correlation
//! and trace parameters, and stamp it onto every event envelope they publish.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventEnvelope, UserId};

/// Context for a single command: who issued it and how to correlate its effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The planner or system account executing this command.
    pub user_id: UserId,

    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,

    /// Source of this command (e.g., "api", "solver", "refresher").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: None,
            trace_id: None,
            source: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn correlation_id_opt(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Copies user, correlation and trace context onto an outgoing envelope.
    pub fn stamp(&self, envelope: EventEnvelope, correlation_id: &str) -> EventEnvelope {
        let envelope = envelope
            .with_user_id(self.user_id.to_string())
            .with_correlation_id(correlation_id);
        match self.trace_id() {
            Some(trace) => envelope.with_trace_id(trace),
            None => envelope,
        }
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a planner user ID.
    pub fn test_fixture() -> Self {
        Self::new(UserId::new("planner-test").unwrap())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}
