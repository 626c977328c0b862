use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{SkillLevel, ValidationError};

/// Name of a certifiable skill, normalized to uppercase (e.g. `CNC_MILLING`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkillType(String);

impl SkillType {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("skill_type"));
        }
        Ok(Self(name.to_ascii_uppercase().replace([' ', '-'], "_")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SkillType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SkillType::new(&value)
    }
}

impl From<SkillType> for String {
    fn from(skill: SkillType) -> Self {
        skill.0
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An operator's certification in one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProficiencyRecord", into = "ProficiencyRecord")]
pub struct SkillProficiency {
    pub skill: SkillType,
    pub level: SkillLevel,
    pub certified_on: NaiveDate,
    pub expires_on: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize)]
struct ProficiencyRecord {
    skill: SkillType,
    level: SkillLevel,
    certified_on: NaiveDate,
    #[serde(default)]
    expires_on: Option<NaiveDate>,
}

impl TryFrom<ProficiencyRecord> for SkillProficiency {
    type Error = ValidationError;

    fn try_from(record: ProficiencyRecord) -> Result<Self, Self::Error> {
        SkillProficiency::new(record.skill, record.level, record.certified_on, record.expires_on)
    }
}

impl From<SkillProficiency> for ProficiencyRecord {
    fn from(proficiency: SkillProficiency) -> Self {
        Self {
            skill: proficiency.skill,
            level: proficiency.level,
            certified_on: proficiency.certified_on,
            expires_on: proficiency.expires_on,
        }
    }
}

impl SkillProficiency {
    pub fn new(
        skill: SkillType,
        level: SkillLevel,
        certified_on: NaiveDate,
        expires_on: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        if let Some(expiry) = expires_on {
            if expiry < certified_on {
                return Err(ValidationError::invalid_format(
                    "expires_on",
                    format!("expiry {} precedes certification {}", expiry, certified_on),
                ));
            }
        }
        Ok(Self {
            skill,
            level,
            certified_on,
            expires_on,
        })
    }

    /// Expired once the evaluation date is past the expiry date.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expires_on.map_or(false, |expiry| as_of > expiry)
    }

    /// Valid on `as_of` and at least `required`.
    pub fn satisfies(&self, required: SkillLevel, as_of: NaiveDate) -> bool {
        !self.is_expired(as_of) && self.level.meets_requirement(required)
    }
}

/// Minimum skill levels demanded by a machine or task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillRequirements(BTreeMap<SkillType, SkillLevel>);

impl SkillRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a requirement, keeping the stricter level if the skill is already required.
    pub fn require(mut self, skill: SkillType, level: SkillLevel) -> Self {
        let entry = self.0.entry(skill).or_insert(level);
        *entry = (*entry).max(level);
        self
    }

    /// Union of both sets, keeping the stricter level per skill.
    pub fn merged_with(&self, other: &SkillRequirements) -> SkillRequirements {
        other
            .iter()
            .fold(self.clone(), |acc, (skill, level)| acc.require(skill.clone(), *level))
    }

    pub fn level_for(&self, skill: &SkillType) -> Option<SkillLevel> {
        self.0.get(skill).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkillType, &SkillLevel)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn skill_type_is_normalized() {
        assert_eq!(SkillType::new(" cnc milling ").unwrap().as_str(), "CNC_MILLING");
        assert!(SkillType::new("  ").is_err());
    }

    #[test]
    fn expiry_is_exclusive_of_the_expiry_date() {
        let prof = SkillProficiency::new(
            SkillType::new("welding").unwrap(),
            SkillLevel::Expert,
            day(2023, 1, 1),
            Some(day(2024, 6, 30)),
        )
        .unwrap();
        assert!(!prof.is_expired(day(2024, 6, 30)));
        assert!(prof.is_expired(day(2024, 7, 1)));
        assert!(!prof.satisfies(SkillLevel::Basic, day(2024, 7, 1)));
    }

    #[test]
    fn expiry_before_certification_is_rejected() {
        let result = SkillProficiency::new(
            SkillType::new("welding").unwrap(),
            SkillLevel::Basic,
            day(2024, 1, 1),
            Some(day(2023, 1, 1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn deserialized_proficiency_is_validated() {
        let prof = SkillProficiency::new(
            SkillType::new("welding").unwrap(),
            SkillLevel::Intermediate,
            day(2023, 1, 1),
            Some(day(2025, 1, 1)),
        )
        .unwrap();
        let mut json = serde_json::to_value(&prof).unwrap();
        assert_eq!(serde_json::from_value::<SkillProficiency>(json.clone()).unwrap(), prof);

        json["expires_on"] = serde_json::json!("2022-06-30");
        assert!(serde_json::from_value::<SkillProficiency>(json).is_err());
    }

    #[test]
    fn requirements_keep_stricter_level() {
        let weld = SkillType::new("welding").unwrap();
        let reqs = SkillRequirements::new()
            .require(weld.clone(), SkillLevel::Basic)
            .require(weld.clone(), SkillLevel::Expert)
            .require(weld.clone(), SkillLevel::Intermediate);
        assert_eq!(reqs.level_for(&weld), Some(SkillLevel::Expert));
        assert_eq!(reqs.len(), 1);
    }

    #[test]
    fn merge_unions_requirements() {
        let a = SkillRequirements::new().require(SkillType::new("a").unwrap(), SkillLevel::Basic);
        let b = SkillRequirements::new()
            .require(SkillType::new("a").unwrap(), SkillLevel::Expert)
            .require(SkillType::new("b").unwrap(), SkillLevel::Basic);
        let merged = a.merged_with(&b);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.level_for(&SkillType::new("a").unwrap()),
            Some(SkillLevel::Expert)
        );
    }
}
