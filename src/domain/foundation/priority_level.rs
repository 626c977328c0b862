//! PriorityLevel value object for job urgency.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Job priority, ordered Low < Normal < High < Critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum PriorityLevel {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl PriorityLevel {
    const ORDERED: [PriorityLevel; 4] = [
        PriorityLevel::Low,
        PriorityLevel::Normal,
        PriorityLevel::High,
        PriorityLevel::Critical,
    ];

    /// Creates a PriorityLevel from its ordinal (1-4).
    pub fn from_level(level: u8) -> Result<Self, ValidationError> {
        match level {
            1..=4 => Ok(Self::ORDERED[usize::from(level - 1)]),
            _ => Err(ValidationError::out_of_range(
                "priority",
                1,
                4,
                i64::from(level),
            )),
        }
    }

    /// Returns the numeric level.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Objective weight for the solver; doubles with each level.
    pub fn weight_factor(&self) -> u32 {
        1 << (self.value() - 1)
    }

    /// Raises the priority by `steps`, saturating at Critical.
    pub fn boost_priority(&self, steps: u8) -> PriorityLevel {
        let level = self.value().saturating_add(steps).min(4);
        Self::ORDERED[usize::from(level - 1)]
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityLevel::Low => "LOW",
            PriorityLevel::Normal => "NORMAL",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}
