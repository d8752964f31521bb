//! Cost records produced by an estimator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Estimated cost of a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCost {
    pub compute_cost: i64,
    /// Largest output the node produces, i.e. the cost of shipping it elsewhere.
    pub max_memory_size: i64,
    #[serde(default)]
    pub memory_time: i64,
    #[serde(default)]
    pub compute_time: i64,
}

impl NodeCost {
    pub fn new(compute_cost: i64, max_memory_size: i64) -> Self {
        Self {
            compute_cost,
            max_memory_size,
            memory_time: 0,
            compute_time: compute_cost,
        }
    }

    pub fn execution_time(&self) -> i64 {
        self.compute_time + self.memory_time
    }
}

/// Whole-graph summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Costs {
    pub execution_time: i64,
    pub compute_time: i64,
    pub memory_time: i64,
}

impl Costs {
    pub fn accumulate(&mut self, node: &NodeCost) {
        self.compute_time += node.compute_time;
        self.memory_time += node.memory_time;
        self.execution_time += node.execution_time();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub nodes: HashMap<String, NodeCost>,
    pub summary: Costs,
}

impl CostEstimate {
    pub fn get(&self, node: &str) -> Option<&NodeCost> {
        self.nodes.get(node)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_compute_cost(&self) -> i64 {
        self.nodes.values().map(|cost| cost.compute_cost).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates_times() {
        let mut summary = Costs::default();
        summary.accumulate(&NodeCost {
            compute_cost: 10,
            max_memory_size: 64,
            memory_time: 3,
            compute_time: 7,
        });
        summary.accumulate(&NodeCost::new(5, 0));
        assert_eq!(summary.compute_time, 12);
        assert_eq!(summary.memory_time, 3);
        assert_eq!(summary.execution_time, 15);
    }

    #[test]
    fn test_node_cost_defaults_optional_times() {
        let cost: NodeCost =
            serde_json::from_str(r#"{"compute_cost": 4, "max_memory_size": 16}"#).unwrap();
        assert_eq!(cost.memory_time, 0);
        assert_eq!(cost.compute_time, 0);
    }
}
