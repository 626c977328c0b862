//! CalendarSource port - where the business calendar comes from.

use async_trait::async_trait;

use crate::domain::calendar::BusinessCalendar;
use crate::domain::foundation::DomainError;

/// Loads the business calendar (working hours per weekday plus holidays).
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// # Errors
    ///
    /// - `ValidationFailed` / `InvalidFormat` for malformed calendar data
    /// - `InternalError` if the source cannot be read
    async fn load_calendar(&self) -> Result<BusinessCalendar, DomainError>;
}
