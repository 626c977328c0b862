//! Scheduling engine tunables

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::SolveSettings;
use crate::domain::analysis::CriticalSequenceManager;
use crate::domain::calendar::BusinessCalendar;

/// Thresholds and intervals of the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Utilization above which a resource is reported as a bottleneck
    #[serde(default = "default_bottleneck_threshold")]
    pub bottleneck_threshold_percent: u32,

    /// How far `next_working_time` searches ahead
    #[serde(default = "default_calendar_search_days")]
    pub calendar_search_days: u32,

    /// Remaining buffer below this share of the job window raises a due-date warning
    #[serde(default = "default_due_date_warning")]
    pub due_date_warning_percent: u32,

    #[serde(default = "default_solver_timeout")]
    pub solver_timeout_secs: u64,

    #[serde(default = "default_refresh_interval")]
    pub critical_path_refresh_secs: u64,
}

fn default_bottleneck_threshold() -> u32 {
    85
}

fn default_calendar_search_days() -> u32 {
    14
}

fn default_due_date_warning() -> u32 {
    10
}

fn default_solver_timeout() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    3600
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bottleneck_threshold_percent: default_bottleneck_threshold(),
            calendar_search_days: default_calendar_search_days(),
            due_date_warning_percent: default_due_date_warning(),
            solver_timeout_secs: default_solver_timeout(),
            critical_path_refresh_secs: default_refresh_interval(),
        }
    }
}

impl EngineConfig {
    pub fn solver_timeout(&self) -> Duration {
        Duration::from_secs(self.solver_timeout_secs)
    }

    pub fn critical_path_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.critical_path_refresh_secs)
    }

    /// Settings for `SolveScheduleHandler`.
    pub fn solve_settings(&self) -> SolveSettings {
        SolveSettings {
            solver_timeout: self.solver_timeout(),
            due_date_warning_percent: self.due_date_warning_percent,
        }
    }

    /// Bottleneck analysis at `bottleneck_threshold_percent`.
    pub fn critical_sequence_manager(&self) -> CriticalSequenceManager {
        CriticalSequenceManager::new(self.bottleneck_threshold_percent)
    }

    /// Monday to Friday 08:00-17:00 calendar searching `calendar_search_days` ahead.
    pub fn standard_calendar(&self) -> BusinessCalendar {
        BusinessCalendar::standard_calendar().with_search_horizon(self.calendar_search_days)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=100).contains(&self.bottleneck_threshold_percent) {
            return Err(ValidationError::InvalidBottleneckThreshold(
                self.bottleneck_threshold_percent,
            ));
        }
        if self.due_date_warning_percent > 100 {
            return Err(ValidationError::InvalidDueDateWarning(
                self.due_date_warning_percent,
            ));
        }
        if !(1..=366).contains(&self.calendar_search_days) {
            return Err(ValidationError::InvalidSearchHorizon(
                self.calendar_search_days,
            ));
        }
        if !(1..=3600).contains(&self.solver_timeout_secs) {
            return Err(ValidationError::InvalidSolverTimeout(self.solver_timeout_secs));
        }
        if self.critical_path_refresh_secs == 0 {
            return Err(ValidationError::InvalidRefreshInterval);
        }
        Ok(())
    }
}
