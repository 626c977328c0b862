//! EventSubscriber port - registering interest in job events.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing published events.
///
/// Handlers should be idempotent: delivery is at-least-once.
///
/// # Example
///
/// ```ignore
/// struct DispatchBoard { /* ... */ }
///
/// #[async_trait]
/// impl EventHandler for DispatchBoard {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let job_event: JobEvent = event.payload_as()?;
///         // Refresh the board...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "DispatchBoard"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing to events by type (e.g. `"job.task_completed.v1"`).
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Subscribe the same handler to several event types.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

/// Publishing and subscribing together.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
