use serde::{Deserialize, Serialize};

use super::SkillRequirements;
use crate::domain::foundation::{
    AutomationLevel, Cost, Duration, EfficiencyFactor, MachineId, MachineStatus, StateMachine,
    StatusTransitionError, ValidationError,
};

/// A machine on the shop floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    /// Work center or zone the machine belongs to; used to group bottlenecks.
    pub zone: String,
    pub automation_level: AutomationLevel,
    pub status: MachineStatus,
    pub efficiency: EfficiencyFactor,
    pub hourly_rate: Cost,
    pub skill_requirements: SkillRequirements,
}

impl Machine {
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        hourly_rate: Cost,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("machine_name"));
        }
        let zone = zone.into().trim().to_string();
        if zone.is_empty() {
            return Err(ValidationError::empty_field("zone"));
        }
        Ok(Self {
            id: MachineId::new(),
            name,
            zone,
            automation_level: AutomationLevel::default(),
            status: MachineStatus::default(),
            efficiency: EfficiencyFactor::default(),
            hourly_rate,
            skill_requirements: SkillRequirements::new(),
        })
    }

    pub fn with_automation(mut self, level: AutomationLevel) -> Self {
        self.automation_level = level;
        self
    }

    pub fn with_efficiency(mut self, efficiency: EfficiencyFactor) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn with_skill_requirements(mut self, requirements: SkillRequirements) -> Self {
        self.skill_requirements = requirements;
        self
    }

    pub fn change_status(&mut self, target: MachineStatus) -> Result<(), StatusTransitionError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }

    pub fn can_accept_work(&self) -> bool {
        self.status.can_accept_work()
    }

    /// Run time on this machine for a routing standard time.
    pub fn run_time(&self, standard: &Duration) -> Duration {
        self.efficiency.adjust(standard)
    }
}
