//! MachineStatus enum for shop-floor equipment availability.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Operational status of a machine.
///
/// Machines have no terminal state: every state can move to every other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    #[default]
    Available,
    Busy,
    Maintenance,
    Offline,
}

impl MachineStatus {
    /// Returns true if work can be dispatched to the machine.
    pub fn can_accept_work(&self) -> bool {
        matches!(self, MachineStatus::Available | MachineStatus::Busy)
    }
}

impl StateMachine for MachineStatus {
    const ENTITY: &'static str = "Machine";

    fn all() -> &'static [Self] {
        use MachineStatus::*;
        &[Available, Busy, Maintenance, Offline]
    }

    fn valid_transitions(&self) -> &'static [Self] {
        use MachineStatus::*;
        match self {
            Available => &[Busy, Maintenance, Offline],
            Busy => &[Available, Maintenance, Offline],
            Maintenance => &[Available, Busy, Offline],
            Offline => &[Available, Busy, Maintenance],
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MachineStatus::Available => "AVAILABLE",
            MachineStatus::Busy => "BUSY",
            MachineStatus::Maintenance => "MAINTENANCE",
            MachineStatus::Offline => "OFFLINE",
        };
        write!(f, "{}", s)
    }
}
