use serde::{Deserialize, Serialize};

use crate::score::HardSoftScore;

/// A machine that can host processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudComputer {
    pub id: u64,
    pub cpu_power: i64,
    pub memory: i64,
    pub network_bandwidth: i64,
    /// Paid once per process assigned to this computer.
    pub cost: i64,
}

impl CloudComputer {
    pub fn new(id: u64, cpu_power: i64, memory: i64, network_bandwidth: i64, cost: i64) -> Self {
        Self {
            id,
            cpu_power,
            memory,
            network_bandwidth,
            cost,
        }
    }
}

/// A workload that must run on exactly one computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProcess {
    pub id: u64,
    pub required_cpu_power: i64,
    pub required_memory: i64,
    pub required_network_bandwidth: i64,
    /// Id of the hosting computer; `None` until assigned.
    #[serde(default)]
    pub computer_id: Option<u64>,
}

impl CloudProcess {
    pub fn new(
        id: u64,
        required_cpu_power: i64,
        required_memory: i64,
        required_network_bandwidth: i64,
    ) -> Self {
        Self {
            id,
            required_cpu_power,
            required_memory,
            required_network_bandwidth,
            computer_id: None,
        }
    }

    /// Sum over all dimensions, used to place large processes first.
    pub fn total_demand(&self) -> i64 {
        self.required_cpu_power + self.required_memory + self.required_network_bandwidth
    }
}

/// A problem instance, and once solved, its solution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudBalance {
    pub id: u64,
    #[serde(default)]
    pub computers: Vec<CloudComputer>,
    #[serde(default)]
    pub processes: Vec<CloudProcess>,
    #[serde(default)]
    pub score: Option<HardSoftScore>,
}

impl CloudBalance {
    pub fn new(id: u64, computers: Vec<CloudComputer>, processes: Vec<CloudProcess>) -> Self {
        Self {
            id,
            computers,
            processes,
            score: None,
        }
    }

    pub fn computer(&self, id: u64) -> Option<&CloudComputer> {
        self.computers.iter().find(|c| c.id == id)
    }

    pub fn unassigned_count(&self) -> usize {
        self.processes.iter().filter(|p| p.computer_id.is_none()).count()
    }
}
