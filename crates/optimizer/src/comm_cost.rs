//! Communication cost of a node under a hypothetical device assignment.

use crate::assignment::{Assignments, DeviceId};
use crate::cost_index::{CostIndex, NodeId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeCommCost {
    pub compute_cost: i64,
    /// Incoming bytes produced on another device.
    pub external_cost: i64,
    /// Incoming bytes produced on the same device.
    pub internal_cost: i64,
}

impl NodeCommCost {
    /// Cut contribution of the node; lower is better.
    pub fn delta(&self) -> i64 {
        self.external_cost - self.internal_cost
    }
}

/// Costs `node` as if it ran on `device`, leaving `assignments` untouched.
///
/// Producers that are unassigned or have no cost entry contribute nothing.
pub fn comm_cost(
    index: &CostIndex<'_>,
    assignments: &Assignments,
    node: NodeId,
    device: DeviceId,
) -> NodeCommCost {
    let mut cost = NodeCommCost {
        compute_cost: index.compute_cost(node),
        ..Default::default()
    };

    for &producer in index.producers(node) {
        let Some(producer_cost) = index.cost(producer) else {
            continue;
        };
        match assignments.device(producer) {
            Some(producer_device) if producer_device == device => {
                cost.internal_cost += producer_cost.max_memory_size;
            }
            Some(_) => cost.external_cost += producer_cost.max_memory_size,
            None => {}
        }
    }
    cost
}

/// Sum of external cost over every assigned node at its current device.
pub fn total_external_cost(index: &CostIndex<'_>, assignments: &Assignments) -> i64 {
    index
        .node_ids()
        .filter_map(|node| {
            assignments
                .device(node)
                .map(|device| comm_cost(index, assignments, node, device).external_cost)
        })
        .sum()
}
