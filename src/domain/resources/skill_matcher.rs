//! Matching operator certifications against skill requirements.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::{Operator, SkillRequirements, SkillType};
use crate::domain::foundation::SkillLevel;

/// Why an operator falls short of one required skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualificationGap {
    pub skill: SkillType,
    pub required: SkillLevel,
    /// Level held, if any certification exists.
    pub held: Option<SkillLevel>,
    pub expired: bool,
}

/// A qualified operator with the data used to rank them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedOperator<'a> {
    pub operator: &'a Operator,
    /// Sum of held levels over the required skills.
    pub proficiency_score: u32,
    pub latest_certification: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Coverage of one required skill across the operator workforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGapReport {
    pub skill: SkillType,
    /// Strictest level demanded by any of the analysed requirements.
    pub required_level: SkillLevel,
    /// Number of requirement sets that need the skill.
    pub demand: usize,
    /// Operators holding a valid certification at `required_level` or better.
    pub qualified_holders: usize,
    pub training_priority: TrainingPriority,
}

/// Stateless skill matching service; safe to share between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillMatcher;

impl SkillMatcher {
    pub fn new() -> Self {
        Self
    }

    /// True if every required skill is held at the required level or better
    /// and is not expired on `as_of`.
    pub fn is_qualified(
        &self,
        operator: &Operator,
        requirements: &SkillRequirements,
        as_of: NaiveDate,
    ) -> bool {
        requirements.iter().all(|(skill, required)| {
            operator
                .proficiency(skill)
                .map_or(false, |p| p.satisfies(*required, as_of))
        })
    }

    /// Every unmet requirement, in skill order. Empty when qualified.
    pub fn qualification_gaps(
        &self,
        operator: &Operator,
        requirements: &SkillRequirements,
        as_of: NaiveDate,
    ) -> Vec<QualificationGap> {
        requirements
            .iter()
            .filter_map(|(skill, required)| {
                let held = operator.proficiency(skill);
                if held.map_or(false, |p| p.satisfies(*required, as_of)) {
                    return None;
                }
                Some(QualificationGap {
                    skill: skill.clone(),
                    required: *required,
                    held: held.map(|p| p.level),
                    expired: held.map_or(false, |p| p.is_expired(as_of)),
                })
            })
            .collect()
    }

    /// Qualified candidates, best first.
    ///
    /// Ordered by proficiency score descending, then most recent certification
    /// among the required skills, then operator id for a stable result.
    pub fn rank_operators_by_skill<'a>(
        &self,
        candidates: &'a [Operator],
        requirements: &SkillRequirements,
        as_of: NaiveDate,
    ) -> Vec<RankedOperator<'a>> {
        let skills: Vec<&SkillType> = requirements.iter().map(|(skill, _)| skill).collect();
        let mut ranked: Vec<RankedOperator<'a>> = candidates
            .iter()
            .filter(|op| self.is_qualified(op, requirements, as_of))
            .map(|operator| RankedOperator {
                operator,
                proficiency_score: skills
                    .iter()
                    .filter_map(|skill| operator.proficiency(skill))
                    .map(|p| u32::from(p.level.value()))
                    .sum(),
                latest_certification: operator.latest_certification(skills.iter().copied()),
            })
            .collect();
        ranked.sort_by_key(|r| {
            (
                Reverse(r.proficiency_score),
                Reverse(r.latest_certification),
                r.operator.id,
            )
        });
        ranked
    }

    /// Required skills with the fewest qualified holders first.
    pub fn skill_gap_analysis(
        &self,
        operators: &[Operator],
        requirements: &[SkillRequirements],
        as_of: NaiveDate,
    ) -> Vec<SkillGapReport> {
        let mut demand: BTreeMap<&SkillType, (SkillLevel, usize)> = BTreeMap::new();
        for set in requirements {
            for (skill, level) in set.iter() {
                let entry = demand.entry(skill).or_insert((*level, 0));
                entry.0 = entry.0.max(*level);
                entry.1 += 1;
            }
        }

        let mut reports: Vec<SkillGapReport> = demand
            .into_iter()
            .map(|(skill, (required_level, demand))| {
                let qualified_holders = operators
                    .iter()
                    .filter(|op| {
                        op.proficiency(skill)
                            .map_or(false, |p| p.satisfies(required_level, as_of))
                    })
                    .count();
                SkillGapReport {
                    skill: skill.clone(),
                    required_level,
                    demand,
                    qualified_holders,
                    training_priority: training_priority(qualified_holders, demand),
                }
            })
            .collect();
        reports.sort_by(|a, b| {
            a.qualified_holders
                .cmp(&b.qualified_holders)
                .then(b.demand.cmp(&a.demand))
                .then(a.skill.cmp(&b.skill))
        });
        reports
    }
}

fn training_priority(holders: usize, demand: usize) -> TrainingPriority {
    if holders == 0 {
        TrainingPriority::Critical
    } else if holders < demand {
        TrainingPriority::High
    } else if holders < demand * 2 {
        TrainingPriority::Medium
    } else {
        TrainingPriority::Low
    }
}
