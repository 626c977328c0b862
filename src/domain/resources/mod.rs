//! Shop-floor resources: machines, operators and their skills.
//!
//! Machines and operators are independent entities. Tasks refer to them by
//! id only and look them up through a `ResourcePool` when needed.

mod machine;
mod operator;
mod pool;
mod skill;
mod skill_matcher;

pub use machine::Machine;
pub use operator::Operator;
pub use pool::ResourcePool;
pub use skill::{SkillProficiency, SkillRequirements, SkillType};
pub use skill_matcher::{
    QualificationGap, RankedOperator, SkillGapReport, SkillMatcher, TrainingPriority,
};
