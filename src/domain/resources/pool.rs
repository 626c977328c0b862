use std::collections::HashMap;

use super::{Machine, Operator};
use crate::domain::foundation::{MachineId, OperatorId};

/// Read-only lookup of machines and operators by id.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    machines: HashMap<MachineId, Machine>,
    operators: HashMap<OperatorId, Operator>,
}

impl ResourcePool {
    pub fn new(
        machines: impl IntoIterator<Item = Machine>,
        operators: impl IntoIterator<Item = Operator>,
    ) -> Self {
        Self {
            machines: machines.into_iter().map(|m| (m.id, m)).collect(),
            operators: operators.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    pub fn machine(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    pub fn operator(&self, id: &OperatorId) -> Option<&Operator> {
        self.operators.get(id)
    }

    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.values()
    }

    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }
}
