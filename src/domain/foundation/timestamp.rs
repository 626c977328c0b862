//! Timestamp value object for immutable points in time.
//!
//! The domain never reads a wall clock: every operation that needs "now"
//! receives a `Timestamp` from its caller (see `ports::Clock`).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Immutable point in time, always UTC.
///
/// Shop-floor calendars are evaluated against the UTC wall time of the
/// timestamp; deployments that run in a local zone convert at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 string such as `2024-01-15T10:30:00Z`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ValidationError::invalid_format("timestamp", e.to_string()))
    }

    /// Builds a timestamp from a calendar date and a minute of the day.
    ///
    /// `minute_of_day` may be 1440 to express the midnight that ends the day.
    pub fn at(date: NaiveDate, minute_of_day: u32) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        Self(Utc.from_utc_datetime(&midnight) + Duration::minutes(i64::from(minute_of_day)))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Whole minutes elapsed since `other` (negative if `other` is later).
    pub fn minutes_since(&self, other: &Timestamp) -> i64 {
        self.duration_since(other).num_minutes()
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by adding the specified number of minutes.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Creates a new timestamp offset by a chrono duration.
    pub fn plus(&self, offset: Duration) -> Self {
        Self(self.0 + offset)
    }

    /// The calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Minutes elapsed since midnight (0–1439).
    pub fn minute_of_day(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// Weekday index with Monday = 0 through Sunday = 6.
    pub fn weekday_index(&self) -> u8 {
        self.0.weekday().num_days_from_monday() as u8
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn timestamp_from_datetime_preserves_value() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.as_datetime(), &dt);
    }

    #[test]
    fn timestamp_parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn timestamp_ordering_works() {
        let earlier = ts("2024-01-15T10:00:00Z");
        let later = ts("2024-01-15T10:05:00Z");

        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
        assert_eq!(later.minutes_since(&earlier), 5);
        assert_eq!(earlier.minutes_since(&later), -5);
    }

    #[test]
    fn timestamp_at_builds_from_date_and_minute() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Timestamp::at(date, 8 * 60), ts("2024-01-15T08:00:00Z"));
        assert_eq!(Timestamp::at(date, 1440), ts("2024-01-16T00:00:00Z"));
    }

    #[test]
    fn timestamp_calendar_accessors() {
        // 2024-01-13 is a Saturday
        let saturday = ts("2024-01-13T10:15:00Z");
        assert_eq!(saturday.weekday_index(), 5);
        assert_eq!(saturday.minute_of_day(), 615);
        assert_eq!(saturday.date(), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let json = serde_json::to_string(&ts("2024-01-15T10:30:00Z")).unwrap();
        assert!(json.contains("2024-01-15"));
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let parsed: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(parsed.as_datetime().year(), 2024);
    }

    #[test]
    fn timestamp_plus_minutes_adds_correctly() {
        let start = ts("2024-01-15T10:00:00Z");
        assert_eq!(start.plus_minutes(90), ts("2024-01-15T11:30:00Z"));
        assert_eq!(start.add_days(2), ts("2024-01-17T10:00:00Z"));
    }
}
