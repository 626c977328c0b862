use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{
    CalendarError, Duration, TimeWindow, Timestamp, ValidationError,
};

/// Search bound for calendar advancement when none is configured.
pub const DEFAULT_SEARCH_HORIZON_DAYS: u32 = 14;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

const DAYS_PER_WEEK: usize = 7;

/// Working hours per weekday (Monday = 0) and a set of holiday dates.
///
/// Each working window is a relative `TimeWindow` in minutes since midnight;
/// both bounds count as working time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarRecord", into = "CalendarRecord")]
pub struct BusinessCalendar {
    working_hours: [Option<TimeWindow>; DAYS_PER_WEEK],
    holidays: BTreeSet<NaiveDate>,
    search_horizon_days: u32,
}

/// Serialized form; deserializing goes through `BusinessCalendar::new`.
#[derive(Serialize, Deserialize)]
struct CalendarRecord {
    working_hours: [Option<TimeWindow>; DAYS_PER_WEEK],
    #[serde(default)]
    holidays: BTreeSet<NaiveDate>,
    #[serde(default = "default_search_horizon")]
    search_horizon_days: u32,
}

fn default_search_horizon() -> u32 {
    DEFAULT_SEARCH_HORIZON_DAYS
}

impl TryFrom<CalendarRecord> for BusinessCalendar {
    type Error = ValidationError;

    fn try_from(record: CalendarRecord) -> Result<Self, Self::Error> {
        Ok(BusinessCalendar::new(record.working_hours, record.holidays)?
            .with_search_horizon(record.search_horizon_days))
    }
}

impl From<BusinessCalendar> for CalendarRecord {
    fn from(calendar: BusinessCalendar) -> Self {
        Self {
            working_hours: calendar.working_hours,
            holidays: calendar.holidays,
            search_horizon_days: calendar.search_horizon_days,
        }
    }
}

impl BusinessCalendar {
    /// Builds a calendar, checking every window is a relative window within one day.
    pub fn new(
        working_hours: [Option<TimeWindow>; DAYS_PER_WEEK],
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self, ValidationError> {
        for window in working_hours.iter().flatten() {
            let Some((start, end)) = window.relative_bounds() else {
                return Err(ValidationError::invalid_format(
                    "working_hours",
                    format!("expected a relative window, got {}", window.kind().as_str()),
                ));
            };
            if start < 0 || end > MINUTES_PER_DAY {
                return Err(ValidationError::invalid_format(
                    "working_hours",
                    format!("window {} does not fit inside one day", window),
                ));
            }
        }
        Ok(Self {
            working_hours,
            holidays: holidays.into_iter().collect(),
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
        })
    }

    /// Monday to Friday, 08:00 to 17:00, no holidays.
    pub fn standard_calendar() -> Self {
        let shift = TimeWindow::relative(8 * 60, 17 * 60).ok();
        Self {
            working_hours: [shift, shift, shift, shift, shift, None, None],
            holidays: BTreeSet::new(),
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
        }
    }

    /// Overrides how many days `next_working_time` may search ahead.
    pub fn with_search_horizon(mut self, days: u32) -> Self {
        self.search_horizon_days = days;
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    pub fn search_horizon_days(&self) -> u32 {
        self.search_horizon_days
    }

    /// Working window for a weekday index (Monday = 0).
    pub fn working_window(&self, weekday: u8) -> Option<&TimeWindow> {
        self.working_hours
            .get(usize::from(weekday))
            .and_then(Option::as_ref)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn holidays(&self) -> impl Iterator<Item = &NaiveDate> {
        self.holidays.iter()
    }

    /// True if at least one weekday has working hours.
    pub fn has_working_days(&self) -> bool {
        self.working_hours.iter().any(Option::is_some)
    }

    /// Working window of a date as absolute instants; `None` on holidays and days off.
    pub fn window_on(&self, date: NaiveDate) -> Option<(Timestamp, Timestamp)> {
        if self.is_holiday(date) {
            return None;
        }
        let weekday = date.weekday().num_days_from_monday() as u8;
        let (start, end) = self.working_window(weekday)?.relative_bounds()?;
        Some((
            Timestamp::at(date, start as u32),
            Timestamp::at(date, end as u32),
        ))
    }

    /// Whether `instant` falls inside the working window of its day.
    pub fn is_working_time(&self, instant: &Timestamp) -> bool {
        self.window_on(instant.date())
            .map_or(false, |(open, close)| open <= *instant && *instant <= close)
    }

    /// `instant` itself when it is working time, otherwise the next window opening.
    ///
    /// Searches at most `search_horizon_days` days ahead.
    pub fn next_working_time(&self, instant: &Timestamp) -> Result<Timestamp, CalendarError> {
        if self.is_working_time(instant) {
            return Ok(*instant);
        }
        let today = instant.date();
        for offset in 0..=i64::from(self.search_horizon_days) {
            let date = today + chrono::Duration::days(offset);
            if let Some((open, _)) = self.window_on(date) {
                if open > *instant {
                    return Ok(open);
                }
            }
        }
        tracing::warn!(
            from = %instant,
            horizon_days = self.search_horizon_days,
            "calendar has no working time within search horizon"
        );
        Err(CalendarError::NoWorkingTimeFound {
            from: *instant,
            horizon_days: self.search_horizon_days,
        })
    }

    /// Working time contained in `[start, end]`; zero if `end` precedes `start`.
    pub fn working_minutes_between(&self, start: &Timestamp, end: &Timestamp) -> Duration {
        if end <= start {
            return Duration::ZERO;
        }
        let mut total = Duration::ZERO;
        let mut date = start.date();
        while date <= end.date() {
            if let Some((open, close)) = self.window_on(date) {
                let from = open.max(*start);
                let to = close.min(*end);
                if from < to {
                    total = total.add(&Duration::between(&from, &to).unwrap_or_default());
                }
            }
            date = date + chrono::Duration::days(1);
        }
        total
    }

    /// The instant at which `work` of working time, begun at `start`, finishes.
    ///
    /// Work pauses outside working hours and resumes at the next opening.
    pub fn add_working_time(
        &self,
        start: &Timestamp,
        work: &Duration,
    ) -> Result<Timestamp, CalendarError> {
        let mut cursor = self.next_working_time(start)?;
        let mut remaining = *work;
        loop {
            let Some((_, close)) = self.window_on(cursor.date()) else {
                return Err(CalendarError::NoWorkingTimeFound {
                    from: cursor,
                    horizon_days: self.search_horizon_days,
                });
            };
            let available = Duration::between(&cursor, &close).unwrap_or_default();
            if remaining <= available {
                return Ok(cursor.plus(remaining.to_chrono()));
            }
            remaining = remaining.saturating_sub(&available);
            cursor = self.next_opening_after(cursor.date())?;
        }
    }

    /// Absolute working windows for every day from `from` through `days` days later.
    pub fn working_windows(&self, from: &Timestamp, days: u32) -> Vec<TimeWindow> {
        (0..=i64::from(days))
            .filter_map(|offset| self.window_on(from.date() + chrono::Duration::days(offset)))
            .filter(|(_, close)| close > from)
            .filter_map(|(open, close)| TimeWindow::absolute(open.max(*from), close).ok())
            .collect()
    }

    fn next_opening_after(&self, date: NaiveDate) -> Result<Timestamp, CalendarError> {
        for offset in 1..=i64::from(self.search_horizon_days) {
            if let Some((open, _)) = self.window_on(date + chrono::Duration::days(offset)) {
                return Ok(open);
            }
        }
        Err(CalendarError::NoWorkingTimeFound {
            from: Timestamp::at(date, MINUTES_PER_DAY as u32),
            horizon_days: self.search_horizon_days,
        })
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::standard_calendar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2024-03-04 is a Monday; 2024-03-09 a Saturday.

    #[test]
    fn standard_calendar_excludes_saturday() {
        let cal = BusinessCalendar::standard_calendar();
        assert!(!cal.is_working_time(&ts("2024-03-09T10:00:00Z")));
        assert!(cal.is_working_time(&ts("2024-03-04T10:00:00Z")));
    }

    #[test]
    fn saturday_advances_to_monday_opening() {
        let cal = BusinessCalendar::standard_calendar();
        let next = cal.next_working_time(&ts("2024-03-09T10:00:00Z")).unwrap();
        assert_eq!(next, ts("2024-03-11T08:00:00Z"));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let cal = BusinessCalendar::standard_calendar();
        assert!(cal.is_working_time(&ts("2024-03-04T08:00:00Z")));
        assert!(cal.is_working_time(&ts("2024-03-04T17:00:00Z")));
        assert!(!cal.is_working_time(&ts("2024-03-04T17:00:30Z")));
        assert!(!cal.is_working_time(&ts("2024-03-04T07:59:00Z")));
    }

    #[test]
    fn working_instant_is_returned_unchanged() {
        let cal = BusinessCalendar::standard_calendar();
        let instant = ts("2024-03-05T13:37:00Z");
        assert_eq!(cal.next_working_time(&instant).unwrap(), instant);
    }

    #[test]
    fn early_morning_advances_to_same_day_opening() {
        let cal = BusinessCalendar::standard_calendar();
        let next = cal.next_working_time(&ts("2024-03-05T06:15:00Z")).unwrap();
        assert_eq!(next, ts("2024-03-05T08:00:00Z"));
    }

    #[test]
    fn holidays_are_skipped() {
        let cal = BusinessCalendar::standard_calendar().with_holiday(date("2024-03-11"));
        assert!(!cal.is_working_time(&ts("2024-03-11T10:00:00Z")));
        let next = cal.next_working_time(&ts("2024-03-09T10:00:00Z")).unwrap();
        assert_eq!(next, ts("2024-03-12T08:00:00Z"));
    }

    #[test]
    fn calendar_without_working_days_fails_instead_of_looping() {
        let cal = BusinessCalendar::new([None; 7], []).unwrap();
        let from = ts("2024-03-04T10:00:00Z");
        assert_eq!(
            cal.next_working_time(&from).unwrap_err(),
            CalendarError::NoWorkingTimeFound {
                from,
                horizon_days: DEFAULT_SEARCH_HORIZON_DAYS
            }
        );
    }

    #[test]
    fn search_horizon_is_configurable() {
        let sunday_only = TimeWindow::relative(600, 660).ok();
        let cal = BusinessCalendar::new([None, None, None, None, None, None, sunday_only], [])
            .unwrap()
            .with_search_horizon(3);
        assert!(cal.next_working_time(&ts("2024-03-04T10:00:00Z")).is_err());
        let cal = cal.with_search_horizon(7);
        assert_eq!(
            cal.next_working_time(&ts("2024-03-04T10:00:00Z")).unwrap(),
            ts("2024-03-10T10:00:00Z")
        );
    }

    #[test]
    fn rejects_absolute_or_oversized_windows() {
        let absolute =
            TimeWindow::absolute(ts("2024-03-04T08:00:00Z"), ts("2024-03-04T09:00:00Z")).ok();
        assert!(BusinessCalendar::new([absolute, None, None, None, None, None, None], []).is_err());
        let too_long = TimeWindow::relative(0, MINUTES_PER_DAY + 1).ok();
        assert!(BusinessCalendar::new([too_long, None, None, None, None, None, None], []).is_err());
    }

    #[test]
    fn deserializing_applies_the_same_window_checks() {
        let cal = BusinessCalendar::standard_calendar()
            .with_holiday(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap())
            .with_search_horizon(30);
        let json = serde_json::to_value(&cal).unwrap();
        let back: BusinessCalendar = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, cal);

        let mut oversized = json;
        oversized["working_hours"][0] =
            serde_json::json!({"kind": "relative", "start_minute": 0, "end_minute": 1500});
        assert!(serde_json::from_value::<BusinessCalendar>(oversized).is_err());
    }

    #[test]
    fn working_minutes_span_nights_and_weekends() {
        let cal = BusinessCalendar::standard_calendar();
        // Friday 16:00 -> Monday 09:00 = 60 + 60 minutes.
        let minutes =
            cal.working_minutes_between(&ts("2024-03-08T16:00:00Z"), &ts("2024-03-11T09:00:00Z"));
        assert_eq!(minutes, Duration::from_minutes(120).unwrap());
        assert_eq!(
            cal.working_minutes_between(&ts("2024-03-11T09:00:00Z"), &ts("2024-03-08T16:00:00Z")),
            Duration::ZERO
        );
    }

    #[test]
    fn add_working_time_pauses_overnight() {
        let cal = BusinessCalendar::standard_calendar();
        let end = cal
            .add_working_time(&ts("2024-03-08T16:00:00Z"), &Duration::from_minutes(90).unwrap())
            .unwrap();
        assert_eq!(end, ts("2024-03-11T08:30:00Z"));
    }

    #[test]
    fn add_working_time_starts_from_next_opening() {
        let cal = BusinessCalendar::standard_calendar();
        let end = cal
            .add_working_time(&ts("2024-03-09T12:00:00Z"), &Duration::from_minutes(30).unwrap())
            .unwrap();
        assert_eq!(end, ts("2024-03-11T08:30:00Z"));
    }

    #[test]
    fn working_windows_cover_horizon() {
        let cal = BusinessCalendar::standard_calendar();
        let windows = cal.working_windows(&ts("2024-03-04T12:00:00Z"), 6);
        assert_eq!(windows.len(), 5);
        assert_eq!(
            windows[0].absolute_bounds().unwrap().0,
            ts("2024-03-04T12:00:00Z")
        );
    }
}
