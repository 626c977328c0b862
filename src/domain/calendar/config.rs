//! Externally supplied calendar definition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BusinessCalendar, DEFAULT_SEARCH_HORIZON_DAYS, MINUTES_PER_DAY};
use crate::domain::foundation::{TimeWindow, ValidationError};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Opening and closing time of one weekday, as `"HH:MM"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHoursConfig {
    pub start: String,
    pub end: String,
}

/// Calendar file contents: working hours keyed by weekday plus ISO holiday dates.
///
/// ```yaml
/// working_hours:
///   monday: { start: "07:00", end: "15:30" }
///   tuesday: { start: "07:00", end: "15:30" }
/// holidays: ["2024-12-25"]
/// ```
///
/// Weekdays may be named (`monday`, `Mon`) or numbered `0`-`6` from Monday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub working_hours: BTreeMap<String, WorkingHoursConfig>,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub search_horizon_days: Option<u32>,
}

impl CalendarConfig {
    /// Validates every entry and builds the immutable calendar.
    pub fn to_calendar(&self) -> Result<BusinessCalendar, ValidationError> {
        let mut hours: [Option<TimeWindow>; 7] = [None; 7];
        for (day, window) in &self.working_hours {
            let index = parse_weekday(day)?;
            let start = parse_clock(&window.start)?;
            let end = parse_clock(&window.end)?;
            hours[index] = Some(TimeWindow::relative(start, end)?);
        }
        let calendar = BusinessCalendar::new(hours, self.holidays.iter().copied())?;
        Ok(calendar.with_search_horizon(
            self.search_horizon_days
                .unwrap_or(DEFAULT_SEARCH_HORIZON_DAYS),
        ))
    }
}

fn parse_weekday(value: &str) -> Result<usize, ValidationError> {
    let key = value.trim().to_ascii_lowercase();
    if let Ok(index) = key.parse::<usize>() {
        if index < WEEKDAYS.len() {
            return Ok(index);
        }
    }
    WEEKDAYS
        .iter()
        .position(|name| key.len() >= 3 && name.starts_with(&key))
        .ok_or_else(|| {
            ValidationError::invalid_format("weekday", format!("'{}' is not a weekday", value))
        })
}

/// Parses `"HH:MM"` into minutes since midnight; `"24:00"` closes the day.
fn parse_clock(value: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::invalid_format("working_hours", format!("'{}' is not HH:MM", value));
    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    let hours: i64 = hours.parse().map_err(|_| invalid())?;
    let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    let total = hours * 60 + minutes;
    if !(0..=MINUTES_PER_DAY).contains(&total) {
        return Err(invalid());
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    fn hours(start: &str, end: &str) -> WorkingHoursConfig {
        WorkingHoursConfig {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn builds_calendar_from_named_and_numbered_days() {
        let mut working_hours = BTreeMap::new();
        working_hours.insert("Mon".to_string(), hours("07:00", "15:30"));
        working_hours.insert("5".to_string(), hours("08:00", "12:00"));
        let config = CalendarConfig {
            working_hours,
            holidays: vec![NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()],
            search_horizon_days: Some(21),
        };

        let calendar = config.to_calendar().unwrap();

        assert_eq!(
            calendar.working_window(0).unwrap().relative_bounds(),
            Some((420, 930))
        );
        assert!(calendar.working_window(1).is_none());
        assert!(calendar.is_working_time(&Timestamp::parse("2024-03-09T11:00:00Z").unwrap()));
        assert!(!calendar.is_working_time(&Timestamp::parse("2024-03-04T09:00:00Z").unwrap()));
        assert_eq!(calendar.search_horizon_days(), 21);
    }

    #[test]
    fn rejects_malformed_clock_times() {
        for bad in ["7", "25:00", "08:60", "8:5", "ab:cd", "24:01", "08:-5", "+8:00", "-1:00"] {
            assert!(parse_clock(bad).is_err(), "{} should be rejected", bad);
        }
        assert_eq!(parse_clock("24:00").unwrap(), MINUTES_PER_DAY);
        assert_eq!(parse_clock("8:05").unwrap(), 485);
    }

    #[test]
    fn rejects_unknown_weekday_and_inverted_window() {
        let mut working_hours = BTreeMap::new();
        working_hours.insert("funday".to_string(), hours("08:00", "17:00"));
        let config = CalendarConfig {
            working_hours,
            ..Default::default()
        };
        assert!(config.to_calendar().is_err());

        let mut working_hours = BTreeMap::new();
        working_hours.insert("tuesday".to_string(), hours("17:00", "08:00"));
        let config = CalendarConfig {
            working_hours,
            ..Default::default()
        };
        assert!(config.to_calendar().is_err());
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
working_hours:
  monday: { start: "06:00", end: "14:00" }
holidays: ["2024-12-25"]
"#;
        let config: CalendarConfig = serde_yaml::from_str(yaml).unwrap();
        let calendar = config.to_calendar().unwrap();
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()));
        assert_eq!(calendar.search_horizon_days(), DEFAULT_SEARCH_HORIZON_DAYS);
    }
}
