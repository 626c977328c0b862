//! TimeWindow value object.
//!
//! A window is either absolute (two instants) or relative (two minute
//! offsets, typically minutes since midnight). The two kinds never mix:
//! any binary operation across kinds fails with
//! `ValueObjectError::IncompatibleWindowKind`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Duration, Timestamp, ValidationError, ValueObjectError};

/// Which flavor of bounds a window carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Absolute,
    Relative,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Absolute => "absolute",
            WindowKind::Relative => "relative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Bounds {
    Absolute { start: Timestamp, end: Timestamp },
    Relative { start_minute: i64, end_minute: i64 },
}

/// An interval with `start <= end`, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Bounds", into = "Bounds")]
pub struct TimeWindow {
    bounds: Bounds,
}

impl TryFrom<Bounds> for TimeWindow {
    type Error = ValidationError;

    fn try_from(bounds: Bounds) -> Result<Self, Self::Error> {
        match bounds {
            Bounds::Absolute { start, end } => TimeWindow::absolute(start, end),
            Bounds::Relative {
                start_minute,
                end_minute,
            } => TimeWindow::relative(start_minute, end_minute),
        }
    }
}

impl From<TimeWindow> for Bounds {
    fn from(window: TimeWindow) -> Self {
        window.bounds
    }
}

impl TimeWindow {
    /// Creates a window between two instants.
    pub fn absolute(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::invalid_format(
                "time_window",
                format!("start {} is after end {}", start, end),
            ));
        }
        Ok(Self {
            bounds: Bounds::Absolute { start, end },
        })
    }

    /// Creates a window between two minute offsets.
    pub fn relative(start_minute: i64, end_minute: i64) -> Result<Self, ValidationError> {
        if start_minute > end_minute {
            return Err(ValidationError::invalid_format(
                "time_window",
                format!("start minute {} is after end minute {}", start_minute, end_minute),
            ));
        }
        Ok(Self {
            bounds: Bounds::Relative {
                start_minute,
                end_minute,
            },
        })
    }

    pub fn kind(&self) -> WindowKind {
        match self.bounds {
            Bounds::Absolute { .. } => WindowKind::Absolute,
            Bounds::Relative { .. } => WindowKind::Relative,
        }
    }

    /// Start and end instants, if this is an absolute window.
    pub fn absolute_bounds(&self) -> Option<(Timestamp, Timestamp)> {
        match self.bounds {
            Bounds::Absolute { start, end } => Some((start, end)),
            Bounds::Relative { .. } => None,
        }
    }

    /// Start and end offsets, if this is a relative window.
    pub fn relative_bounds(&self) -> Option<(i64, i64)> {
        match self.bounds {
            Bounds::Relative {
                start_minute,
                end_minute,
            } => Some((start_minute, end_minute)),
            Bounds::Absolute { .. } => None,
        }
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        match self.bounds {
            Bounds::Absolute { start, end } => Duration::between(&start, &end).unwrap_or_default(),
            Bounds::Relative {
                start_minute,
                end_minute,
            } => Duration::from_minutes(end_minute - start_minute).unwrap_or_default(),
        }
    }

    /// Whether `other` lies entirely inside this window (bounds inclusive).
    pub fn contains(&self, other: &TimeWindow) -> Result<bool, ValueObjectError> {
        match (self.bounds, other.bounds) {
            (Bounds::Absolute { start, end }, Bounds::Absolute { start: s, end: e }) => {
                Ok(start <= s && e <= end)
            }
            (
                Bounds::Relative {
                    start_minute,
                    end_minute,
                },
                Bounds::Relative {
                    start_minute: s,
                    end_minute: e,
                },
            ) => Ok(start_minute <= s && e <= end_minute),
            _ => Err(self.incompatible(other.kind())),
        }
    }

    /// Whether an instant falls inside this absolute window (bounds inclusive).
    pub fn contains_instant(&self, instant: &Timestamp) -> Result<bool, ValueObjectError> {
        match self.bounds {
            Bounds::Absolute { start, end } => Ok(start <= *instant && *instant <= end),
            Bounds::Relative { .. } => Err(self.incompatible(WindowKind::Absolute)),
        }
    }

    /// Whether a minute offset falls inside this relative window (bounds inclusive).
    pub fn contains_minute(&self, minute: i64) -> Result<bool, ValueObjectError> {
        match self.bounds {
            Bounds::Relative {
                start_minute,
                end_minute,
            } => Ok(start_minute <= minute && minute <= end_minute),
            Bounds::Absolute { .. } => Err(self.incompatible(WindowKind::Relative)),
        }
    }

    /// Whether the two windows share a span of positive length.
    ///
    /// Windows that merely touch (one ends where the other starts) do not overlap.
    pub fn overlaps_with(&self, other: &TimeWindow) -> Result<bool, ValueObjectError> {
        match (self.bounds, other.bounds) {
            (Bounds::Absolute { start, end }, Bounds::Absolute { start: s, end: e }) => {
                Ok(overlaps((start, end), (s, e)))
            }
            (
                Bounds::Relative {
                    start_minute,
                    end_minute,
                },
                Bounds::Relative {
                    start_minute: s,
                    end_minute: e,
                },
            ) => Ok(overlaps((start_minute, end_minute), (s, e))),
            _ => Err(self.incompatible(other.kind())),
        }
    }

    /// The shared span of both windows, or `None` if they do not overlap.
    pub fn intersection_with(
        &self,
        other: &TimeWindow,
    ) -> Result<Option<TimeWindow>, ValueObjectError> {
        match (self.bounds, other.bounds) {
            (Bounds::Absolute { start, end }, Bounds::Absolute { start: s, end: e }) => {
                Ok(intersection((start, end), (s, e))
                    .map(|(start, end)| TimeWindow {
                        bounds: Bounds::Absolute { start, end },
                    }))
            }
            (
                Bounds::Relative {
                    start_minute,
                    end_minute,
                },
                Bounds::Relative {
                    start_minute: s,
                    end_minute: e,
                },
            ) => Ok(intersection((start_minute, end_minute), (s, e)).map(
                |(start_minute, end_minute)| TimeWindow {
                    bounds: Bounds::Relative {
                        start_minute,
                        end_minute,
                    },
                },
            )),
            _ => Err(self.incompatible(other.kind())),
        }
    }

    /// The span covering both windows.
    ///
    /// Returns `None` when the windows neither overlap nor touch, since the
    /// gap between them would not belong to either.
    pub fn union_with(&self, other: &TimeWindow) -> Result<Option<TimeWindow>, ValueObjectError> {
        match (self.bounds, other.bounds) {
            (Bounds::Absolute { start, end }, Bounds::Absolute { start: s, end: e }) => {
                Ok(union((start, end), (s, e)).map(|(start, end)| TimeWindow {
                    bounds: Bounds::Absolute { start, end },
                }))
            }
            (
                Bounds::Relative {
                    start_minute,
                    end_minute,
                },
                Bounds::Relative {
                    start_minute: s,
                    end_minute: e,
                },
            ) => Ok(
                union((start_minute, end_minute), (s, e)).map(|(start_minute, end_minute)| {
                    TimeWindow {
                        bounds: Bounds::Relative {
                            start_minute,
                            end_minute,
                        },
                    }
                }),
            ),
            _ => Err(self.incompatible(other.kind())),
        }
    }

    /// Moves both bounds by a signed number of minutes.
    pub fn shift_by(&self, minutes: i64) -> TimeWindow {
        let bounds = match self.bounds {
            Bounds::Absolute { start, end } => Bounds::Absolute {
                start: start.plus_minutes(minutes),
                end: end.plus_minutes(minutes),
            },
            Bounds::Relative {
                start_minute,
                end_minute,
            } => Bounds::Relative {
                start_minute: start_minute + minutes,
                end_minute: end_minute + minutes,
            },
        };
        TimeWindow { bounds }
    }

    /// Moves the end bound later by `extra`.
    ///
    /// Relative windows have whole-minute resolution, so fractional minutes round up.
    pub fn extend_by(&self, extra: &Duration) -> TimeWindow {
        let bounds = match self.bounds {
            Bounds::Absolute { start, end } => Bounds::Absolute {
                start,
                end: end.plus(extra.to_chrono()),
            },
            Bounds::Relative {
                start_minute,
                end_minute,
            } => Bounds::Relative {
                start_minute,
                end_minute: end_minute + extra.ceil_minutes(),
            },
        };
        TimeWindow { bounds }
    }

    fn incompatible(&self, other: WindowKind) -> ValueObjectError {
        ValueObjectError::IncompatibleWindowKind {
            left: self.kind().as_str(),
            right: other.as_str(),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Bounds::Absolute { start, end } => write!(f, "[{} .. {}]", start, end),
            Bounds::Relative {
                start_minute,
                end_minute,
            } => write!(
                f,
                "[{:02}:{:02} .. {:02}:{:02}]",
                start_minute / 60,
                start_minute % 60,
                end_minute / 60,
                end_minute % 60
            ),
        }
    }
}

fn overlaps<T: Ord + Copy>(a: (T, T), b: (T, T)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

fn intersection<T: Ord + Copy>(a: (T, T), b: (T, T)) -> Option<(T, T)> {
    if overlaps(a, b) {
        Some((a.0.max(b.0), a.1.min(b.1)))
    } else {
        None
    }
}

fn union<T: Ord + Copy>(a: (T, T), b: (T, T)) -> Option<(T, T)> {
    if a.0 <= b.1 && b.0 <= a.1 {
        Some((a.0.min(b.0), a.1.max(b.1)))
    } else {
        None
    }
}
