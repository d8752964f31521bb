//! Estimator trait and a table-backed implementation.

use crate::error::CostError;
use crate::estimate::{CostEstimate, Costs, NodeCost};
use placeforge_ir::GraphDef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Produces per-node costs and a whole-graph summary.
pub trait CostEstimator {
    fn name(&self) -> &str;

    /// Prepares the estimator for `graph`. Must succeed before predicting.
    fn initialize(&mut self, graph: &GraphDef) -> Result<(), CostError>;

    fn predict_costs(&self, graph: &GraphDef) -> Result<CostEstimate, CostError>;
}

/// Estimator answering from an explicit per-node table.
///
/// Nodes missing from the table get no entry; the summary sums the times of
/// the nodes that are present in the graph.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TableCostEstimator {
    nodes: HashMap<String, NodeCost>,
    #[serde(skip)]
    initialized_for: Option<String>,
}

impl TableCostEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost<N: Into<String>>(mut self, node: N, cost: NodeCost) -> Self {
        self.insert(node, cost);
        self
    }

    pub fn insert<N: Into<String>>(&mut self, node: N, cost: NodeCost) {
        self.nodes.insert(node.into(), cost);
    }

    pub fn get(&self, node: &str) -> Option<&NodeCost> {
        self.nodes.get(node)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CostError> {
        let data = fs::read(path)?;
        let table = serde_json::from_slice(&data)?;
        Ok(table)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), CostError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }
}

pub(crate) fn graph_key(graph: &GraphDef) -> String {
    graph.id.clone().unwrap_or_else(|| "<anonymous>".to_string())
}

impl CostEstimator for TableCostEstimator {
    fn name(&self) -> &str {
        "table"
    }

    fn initialize(&mut self, graph: &GraphDef) -> Result<(), CostError> {
        self.initialized_for = Some(graph_key(graph));
        Ok(())
    }

    fn predict_costs(&self, graph: &GraphDef) -> Result<CostEstimate, CostError> {
        let expected = self
            .initialized_for
            .as_ref()
            .ok_or(CostError::NotInitialized)?;
        let actual = graph_key(graph);
        if *expected != actual {
            return Err(CostError::UnknownGraph {
                expected: expected.clone(),
                actual,
            });
        }

        let mut estimate = CostEstimate {
            nodes: HashMap::with_capacity(graph.len()),
            summary: Costs::default(),
        };
        for node in &graph.nodes {
            if let Some(cost) = self.nodes.get(&node.name) {
                estimate.summary.accumulate(cost);
                estimate.nodes.insert(node.name.clone(), *cost);
            }
        }
        Ok(estimate)
    }
}
