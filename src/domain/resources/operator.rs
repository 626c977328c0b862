use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{SkillProficiency, SkillType};
use crate::domain::foundation::{
    Cost, OperatorId, OperatorStatus, StateMachine, StatusTransitionError, ValidationError,
};

/// A machine operator and their certifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub status: OperatorStatus,
    pub proficiencies: Vec<SkillProficiency>,
    pub hourly_rate: Cost,
}

impl Operator {
    pub fn new(name: impl Into<String>, hourly_rate: Cost) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("operator_name"));
        }
        Ok(Self {
            id: OperatorId::new(),
            name,
            status: OperatorStatus::default(),
            proficiencies: Vec::new(),
            hourly_rate,
        })
    }

    /// Adds or replaces the certification for a skill.
    pub fn with_proficiency(mut self, proficiency: SkillProficiency) -> Self {
        self.proficiencies.retain(|p| p.skill != proficiency.skill);
        self.proficiencies.push(proficiency);
        self
    }

    pub fn proficiency(&self, skill: &SkillType) -> Option<&SkillProficiency> {
        self.proficiencies.iter().find(|p| &p.skill == skill)
    }

    /// Most recent certification date among the given skills.
    pub fn latest_certification<'a>(
        &self,
        skills: impl IntoIterator<Item = &'a SkillType>,
    ) -> Option<NaiveDate> {
        skills
            .into_iter()
            .filter_map(|skill| self.proficiency(skill))
            .map(|p| p.certified_on)
            .max()
    }

    pub fn change_status(&mut self, target: OperatorStatus) -> Result<(), StatusTransitionError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }

    pub fn is_assignable(&self) -> bool {
        self.status.is_assignable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SkillLevel;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn with_proficiency_replaces_existing_skill() {
        let weld = SkillType::new("welding").unwrap();
        let op = Operator::new("Ana", Cost::new(30, "USD").unwrap())
            .unwrap()
            .with_proficiency(
                SkillProficiency::new(weld.clone(), SkillLevel::Basic, day(2022, 1, 1), None)
                    .unwrap(),
            )
            .with_proficiency(
                SkillProficiency::new(weld.clone(), SkillLevel::Expert, day(2023, 5, 1), None)
                    .unwrap(),
            );
        assert_eq!(op.proficiencies.len(), 1);
        assert_eq!(op.proficiency(&weld).unwrap().level, SkillLevel::Expert);
        assert_eq!(op.latest_certification([&weld]), Some(day(2023, 5, 1)));
    }

    #[test]
    fn off_shift_operator_cannot_go_on_break() {
        let mut op = Operator::new("Ben", Cost::new(30, "USD").unwrap()).unwrap();
        op.change_status(OperatorStatus::OffShift).unwrap();
        assert!(!op.is_assignable());
        let err = op.change_status(OperatorStatus::OnBreak).unwrap_err();
        assert_eq!(err.from, "OFF_SHIFT");
        assert_eq!(err.to, "ON_BREAK");
    }
}
