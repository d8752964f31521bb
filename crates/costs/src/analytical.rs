//! Op-type driven estimator for graphs without measured costs.

use crate::error::CostError;
use crate::estimate::{CostEstimate, Costs, NodeCost};
use crate::estimator::{graph_key, CostEstimator};
use placeforge_ir::GraphDef;
use std::collections::HashMap;
use tracing::debug;

/// Rough per-op cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpProfile {
    pub compute_cost: i64,
    pub output_bytes: i64,
}

/// Estimates each node from its op type.
///
/// `compute_time` equals the profile's compute cost and `memory_time` is the
/// output size divided by `bytes_per_time_unit`.
#[derive(Debug, Clone)]
pub struct AnalyticalCostEstimator {
    profiles: HashMap<String, OpProfile>,
    fallback: OpProfile,
    bytes_per_time_unit: i64,
    initialized_for: Option<String>,
}

impl AnalyticalCostEstimator {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            fallback: OpProfile {
                compute_cost: 1_000,
                output_bytes: 64 * 1024,
            },
            bytes_per_time_unit: 64,
            initialized_for: None,
        }
    }

    pub fn with_default_profiles() -> Self {
        Self::new()
            .with_profile("MatMul", 100_000, 1024 * 1024)
            .with_profile("Conv2D", 150_000, 1024 * 1024)
            .with_profile("Add", 5_000, 64 * 1024)
            .with_profile("Mul", 5_000, 64 * 1024)
            .with_profile("Sub", 5_000, 64 * 1024)
            .with_profile("ConcatV2", 8_000, 128 * 1024)
            .with_profile("Relu", 2_000, 32 * 1024)
            .with_profile("Softmax", 4_000, 32 * 1024)
            .with_profile("Identity", 100, 1024)
            .with_profile("Const", 0, 4 * 1024)
            .with_profile("Placeholder", 0, 64 * 1024)
            .with_profile("NoOp", 0, 0)
    }

    pub fn with_profile<O: Into<String>>(
        mut self,
        op: O,
        compute_cost: i64,
        output_bytes: i64,
    ) -> Self {
        self.profiles.insert(
            op.into(),
            OpProfile {
                compute_cost,
                output_bytes,
            },
        );
        self
    }

    pub fn with_fallback(mut self, fallback: OpProfile) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_bandwidth(mut self, bytes_per_time_unit: i64) -> Self {
        self.bytes_per_time_unit = bytes_per_time_unit.max(1);
        self
    }

    pub fn profile(&self, op: &str) -> OpProfile {
        self.profiles.get(op).copied().unwrap_or(self.fallback)
    }

    fn node_cost(&self, op: &str) -> NodeCost {
        let profile = self.profile(op);
        NodeCost {
            compute_cost: profile.compute_cost,
            max_memory_size: profile.output_bytes,
            memory_time: profile.output_bytes / self.bytes_per_time_unit,
            compute_time: profile.compute_cost,
        }
    }
}

impl Default for AnalyticalCostEstimator {
    fn default() -> Self {
        Self::with_default_profiles()
    }
}

impl CostEstimator for AnalyticalCostEstimator {
    fn name(&self) -> &str {
        "analytical"
    }

    fn initialize(&mut self, graph: &GraphDef) -> Result<(), CostError> {
        debug!(
            estimator = "analytical",
            nodes = graph.len(),
            profiles = self.profiles.len(),
            "initialized estimator"
        );
        self.initialized_for = Some(graph_key(graph));
        Ok(())
    }

    fn predict_costs(&self, graph: &GraphDef) -> Result<CostEstimate, CostError> {
        if self.initialized_for.is_none() {
            return Err(CostError::NotInitialized);
        }

        let mut nodes = HashMap::with_capacity(graph.len());
        let mut summary = Costs::default();
        for node in &graph.nodes {
            let cost = self.node_cost(&node.op);
            summary.accumulate(&cost);
            nodes.insert(node.name.clone(), cost);
        }
        Ok(CostEstimate { nodes, summary })
    }
}
