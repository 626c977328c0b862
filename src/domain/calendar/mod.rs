//! Business calendar: working hours per weekday plus holidays.
//!
//! Calendars are built once (from code or from a `CalendarConfig`) and never
//! mutated afterwards. Every query is bounded and side-effect free.

mod business_calendar;
mod config;

pub use business_calendar::{BusinessCalendar, DEFAULT_SEARCH_HORIZON_DAYS, MINUTES_PER_DAY};
pub use config::{CalendarConfig, WorkingHoursConfig};
