//! Graph, device and cost statistics, logged before a placement pass.

use placeforge_costs::{CostEstimate, Costs};
use placeforge_ir::{DeviceInventory, GraphDef, PinnedDevices};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub data_edges: usize,
    pub control_edges: usize,
    pub unassigned: usize,
    /// Node count per assigned device.
    pub per_device: BTreeMap<String, usize>,
    /// Node count per op type.
    pub per_op: BTreeMap<String, usize>,
}

impl GraphStats {
    pub fn collect(graph: &GraphDef) -> Self {
        let mut stats = Self {
            nodes: graph.len(),
            ..Default::default()
        };
        for node in &graph.nodes {
            stats.data_edges += node.num_data_inputs();
            stats.control_edges += node.num_control_inputs();
            if node.has_device() {
                *stats.per_device.entry(node.device.clone()).or_default() += 1;
            } else {
                stats.unassigned += 1;
            }
            *stats.per_op.entry(node.op.clone()).or_default() += 1;
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostStats {
    pub nodes_with_cost: usize,
    pub nodes_without_cost: usize,
    pub total_compute_cost: i64,
    pub total_memory_size: i64,
    pub summary: Costs,
}

impl CostStats {
    pub fn collect(graph: &GraphDef, estimate: &CostEstimate) -> Self {
        let mut stats = Self {
            summary: estimate.summary,
            ..Default::default()
        };
        for node in &graph.nodes {
            match estimate.get(&node.name) {
                Some(cost) => {
                    stats.nodes_with_cost += 1;
                    stats.total_compute_cost += cost.compute_cost;
                    stats.total_memory_size += cost.max_memory_size;
                }
                None => stats.nodes_without_cost += 1,
            }
        }
        stats
    }
}

pub fn log_graph_stats(graph: &GraphDef) -> GraphStats {
    let stats = GraphStats::collect(graph);
    debug!(
        graph = graph.id.as_deref().unwrap_or("<anonymous>"),
        nodes = stats.nodes,
        data_edges = stats.data_edges,
        control_edges = stats.control_edges,
        unassigned = stats.unassigned,
        devices = stats.per_device.len(),
        "graph stats"
    );
    for node in &graph.nodes {
        trace!(
            name = %node.name,
            op = %node.op,
            num_inputs = node.inputs.len(),
            device = %node.device,
            "node"
        );
    }
    stats
}

pub fn log_device_stats(inventory: &dyn DeviceInventory, pinned: &PinnedDevices) {
    let devices = inventory.devices();
    debug!(devices = devices.len(), pattern = pinned.pattern(), "device inventory");
    for device in &devices {
        match inventory.properties(device) {
            Some(properties) => debug!(
                device = %device,
                pinned = pinned.is_pinned(device),
                device_type = %properties.device_type,
                frequency_mhz = properties.frequency_mhz,
                num_cores = properties.num_cores,
                memory_size = properties.memory_size,
                bandwidth_kbps = properties.bandwidth_kbps,
                "device"
            ),
            None => debug!(device = %device, pinned = pinned.is_pinned(device), "device"),
        }
    }
}

pub fn log_cost_stats(graph: &GraphDef, estimate: &CostEstimate) -> CostStats {
    let stats = CostStats::collect(graph, estimate);
    debug!(
        nodes_with_cost = stats.nodes_with_cost,
        nodes_without_cost = stats.nodes_without_cost,
        total_compute_cost = stats.total_compute_cost,
        total_memory_size = stats.total_memory_size,
        execution_time = stats.summary.execution_time,
        compute_time = stats.summary.compute_time,
        memory_time = stats.summary.memory_time,
        "cost stats"
    );
    for node in &graph.nodes {
        if let Some(cost) = estimate.get(&node.name) {
            trace!(
                name = %node.name,
                compute_cost = cost.compute_cost,
                max_memory_size = cost.max_memory_size,
                compute_time = cost.compute_time,
                memory_time = cost.memory_time,
                "node cost"
            );
        }
    }
    stats
}
