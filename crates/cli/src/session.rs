//! Placement session: loads inputs from disk and runs the optimizer.

use anyhow::{bail, Context, Result};
use placeforge_costs::{AnalyticalCostEstimator, CostEstimator, TableCostEstimator};
use placeforge_ir::{GraphDef, VirtualCluster};
use placeforge_optimizer::{
    GraphOptimizer, PlacementKnobs, PlacementOptimizer, PlacementResult, PlacementStrategy,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// JSON `VirtualCluster`; takes precedence over `devices`.
    pub cluster: Option<PathBuf>,
    pub devices: Vec<String>,
    /// JSON cost table; the analytical estimator is used when absent.
    pub costs: Option<PathBuf>,
    /// JSON `PlacementKnobs`; defaults plus environment overrides when absent.
    pub knobs: Option<PathBuf>,
    pub compute_margin: Option<f64>,
    pub min_execution_time: Option<i64>,
    pub strategy: Option<PlacementStrategy>,
}

impl SessionOptions {
    pub fn resolve_knobs(&self) -> Result<PlacementKnobs> {
        let mut knobs = match &self.knobs {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading knobs from {}", path.display()))?;
                PlacementKnobs::from_json(&json)
                    .with_context(|| format!("parsing knobs from {}", path.display()))?
            }
            None => PlacementKnobs::default(),
        }
        .with_env_overrides()?;

        if let Some(margin) = self.compute_margin {
            knobs.compute_margin = margin;
        }
        if let Some(threshold) = self.min_execution_time {
            knobs.min_execution_time = threshold;
        }
        if let Some(strategy) = self.strategy {
            knobs.strategy = strategy;
        }
        Ok(knobs)
    }

    pub fn resolve_cluster(&self) -> Result<VirtualCluster> {
        match &self.cluster {
            Some(path) => VirtualCluster::load_from_file(path)
                .with_context(|| format!("loading cluster from {}", path.display())),
            None if !self.devices.is_empty() => {
                Ok(VirtualCluster::from_names(self.devices.iter().cloned()))
            }
            None => bail!("either a cluster file or a device list is required"),
        }
    }

    pub fn resolve_estimator(&self) -> Result<Box<dyn CostEstimator>> {
        match &self.costs {
            Some(path) => {
                let table = TableCostEstimator::load_from_file(path)
                    .with_context(|| format!("loading costs from {}", path.display()))?;
                Ok(Box::new(table))
            }
            None => Ok(Box::new(AnalyticalCostEstimator::with_default_profiles())),
        }
    }
}

pub struct PlacementSession {
    optimizer: PlacementOptimizer,
    cluster: VirtualCluster,
    estimator: Box<dyn CostEstimator>,
}

impl PlacementSession {
    pub fn new(options: &SessionOptions) -> Result<Self> {
        let knobs = options.resolve_knobs()?;
        info!(
            compute_margin = knobs.compute_margin,
            min_execution_time = knobs.min_execution_time,
            strategy = %knobs.strategy,
            pinned_pattern = %knobs.pinned_device_pattern,
            "placement knobs"
        );
        Ok(Self {
            optimizer: PlacementOptimizer::with_default_registry(knobs)?,
            cluster: options.resolve_cluster()?,
            estimator: options.resolve_estimator()?,
        })
    }

    pub fn optimize(&mut self, graph: &GraphDef) -> Result<PlacementResult> {
        self.optimizer
            .optimize(&self.cluster, self.estimator.as_mut(), graph)
    }

    pub fn optimizer(&self) -> &PlacementOptimizer {
        &self.optimizer
    }

    pub fn cluster(&self) -> &VirtualCluster {
        &self.cluster
    }
}

pub fn load_graph(path: &Path) -> Result<GraphDef> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading graph from {}", path.display()))?;
    let graph = GraphDef::from_json(&json)
        .with_context(|| format!("parsing graph from {}", path.display()))?;
    Ok(graph)
}

pub fn write_graph(graph: &GraphDef, path: &Path) -> Result<()> {
    let json = graph.to_json()?;
    fs::write(path, json).with_context(|| format!("writing graph to {}", path.display()))?;
    Ok(())
}
