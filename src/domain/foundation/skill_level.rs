//! SkillLevel value object: certified proficiency on a 1-3 scale.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Operator proficiency in a skill, totally ordered Basic < Intermediate < Expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SkillLevel {
    Basic = 1,
    Intermediate = 2,
    Expert = 3,
}

impl SkillLevel {
    /// Creates a SkillLevel from its ordinal, returning error if out of range.
    pub fn from_level(level: u8) -> Result<Self, ValidationError> {
        match level {
            1 => Ok(SkillLevel::Basic),
            2 => Ok(SkillLevel::Intermediate),
            3 => Ok(SkillLevel::Expert),
            _ => Err(ValidationError::out_of_range(
                "skill_level",
                1,
                3,
                i64::from(level),
            )),
        }
    }

    /// Returns the numeric level.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// True if this level satisfies a minimum requirement.
    pub fn meets_requirement(&self, required: SkillLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkillLevel::Basic => "BASIC",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Expert => "EXPERT",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_level_accepts_one_to_three() {
        assert_eq!(SkillLevel::from_level(1).unwrap(), SkillLevel::Basic);
        assert_eq!(SkillLevel::from_level(3).unwrap(), SkillLevel::Expert);
        match SkillLevel::from_level(4) {
            Err(ValidationError::OutOfRange { actual, .. }) => assert_eq!(actual, 4),
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
        assert!(SkillLevel::from_level(0).is_err());
    }

    #[test]
    fn meets_requirement_is_greater_or_equal() {
        assert!(SkillLevel::Expert.meets_requirement(SkillLevel::Intermediate));
        assert!(SkillLevel::Intermediate.meets_requirement(SkillLevel::Intermediate));
        assert!(!SkillLevel::Basic.meets_requirement(SkillLevel::Intermediate));
    }

    #[test]
    fn ordering_follows_level() {
        assert!(SkillLevel::Basic < SkillLevel::Intermediate);
        assert!(SkillLevel::Intermediate < SkillLevel::Expert);
        assert_eq!(SkillLevel::Expert.value(), 3);
    }
}
