//! Optimizer trait and the placement driver.

use crate::default_placement::default_placement;
use crate::knobs::{PlacementKnobs, PlacementStrategy};
use crate::metadata::{OpMetadataProvider, OpRegistry};
use crate::partitioner::LocalSearchPartitioner;
use crate::report::{PlacementOutcome, PlacementReport};
use crate::stats::{log_cost_stats, log_device_stats, log_graph_stats};
use anyhow::{anyhow, Result};
use placeforge_costs::{CostEstimate, CostEstimator};
use placeforge_ir::{DeviceInventory, GraphDef, PinnedDevices};
use tracing::{debug, info, warn};

/// Placed graph plus what happened to it.
#[derive(Debug, Clone)]
pub struct PlacementResult {
    pub graph: GraphDef,
    pub report: PlacementReport,
}

/// A whole-graph rewrite step.
pub trait GraphOptimizer: Send + Sync {
    /// Name of this optimizer.
    fn name(&self) -> &str;

    /// Produce a rewritten copy of `graph`. The input is never modified.
    fn optimize(
        &self,
        cluster: &dyn DeviceInventory,
        estimator: &mut dyn CostEstimator,
        graph: &GraphDef,
    ) -> Result<PlacementResult>;

    /// Observed performance of a previously optimized graph.
    fn feedback(
        &self,
        cluster: &dyn DeviceInventory,
        graph: &GraphDef,
        optimized: &GraphDef,
        result: f64,
    );
}

/// Assigns devices to relocatable ops, trading cross-device traffic against
/// an even compute split.
pub struct PlacementOptimizer {
    knobs: PlacementKnobs,
    metadata: Box<dyn OpMetadataProvider>,
}

impl PlacementOptimizer {
    pub fn new<M>(knobs: PlacementKnobs, metadata: M) -> Result<Self>
    where
        M: OpMetadataProvider + 'static,
    {
        knobs
            .validate()
            .map_err(|err| anyhow!("invalid placement knobs: {}", err))?;
        Ok(Self {
            knobs,
            metadata: Box::new(metadata),
        })
    }

    /// Optimizer backed by [`OpRegistry::with_default_ops`].
    pub fn with_default_registry(knobs: PlacementKnobs) -> Result<Self> {
        Self::new(knobs, OpRegistry::with_default_ops())
    }

    pub fn knobs(&self) -> &PlacementKnobs {
        &self.knobs
    }

    fn place(
        &self,
        graph: &GraphDef,
        devices: &[String],
        estimate: &CostEstimate,
    ) -> PlacementResult {
        let use_default =
            estimate.is_empty() || self.knobs.strategy == PlacementStrategy::DefaultDevice;

        if use_default {
            let outcome = default_placement(graph, devices, &self.knobs, self.metadata.as_ref());
            let report_outcome = match &outcome.default_device {
                Some(device) => PlacementOutcome::DefaultDevice {
                    device: device.clone(),
                    moved: outcome.moved,
                },
                None => PlacementOutcome::NoTargetDevice,
            };
            let mut report = PlacementReport::new(self.name(), graph.id.clone(), report_outcome);
            report.eligible_nodes = outcome.eligible;
            return PlacementResult {
                graph: outcome.graph,
                report,
            };
        }

        let pinned = PinnedDevices::new(self.knobs.pinned_device_pattern.as_str());
        if pinned.default_device(devices).is_none() {
            warn!(
                devices = devices.len(),
                "no eligible target device, leaving graph unchanged"
            );
            return PlacementResult {
                graph: graph.clone(),
                report: PlacementReport::new(
                    self.name(),
                    graph.id.clone(),
                    PlacementOutcome::NoTargetDevice,
                ),
            };
        }

        let outcome = LocalSearchPartitioner::new(&self.knobs, self.metadata.as_ref())
            .partition(graph, devices, estimate);
        let mut report = PlacementReport::new(
            self.name(),
            graph.id.clone(),
            PlacementOutcome::LocalSearch {
                moved: outcome.moved,
            },
        );
        report.eligible_nodes = outcome.eligible;
        report.total_compute_cost = outcome.total_compute_cost;
        report.external_cost_before = Some(outcome.external_cost_before);
        report.external_cost_after = Some(outcome.external_cost_after);
        report.device_loads = outcome.device_loads;
        report.moves = outcome.moves;
        PlacementResult {
            graph: outcome.graph,
            report,
        }
    }
}

impl GraphOptimizer for PlacementOptimizer {
    fn name(&self) -> &str {
        "placement_optimizer"
    }

    fn optimize(
        &self,
        cluster: &dyn DeviceInventory,
        estimator: &mut dyn CostEstimator,
        graph: &GraphDef,
    ) -> Result<PlacementResult> {
        info!(
            optimizer = self.name(),
            graph = graph.id.as_deref().unwrap_or("<anonymous>"),
            nodes = graph.len(),
            "optimizing graph"
        );
        log_graph_stats(graph);

        let devices = cluster.devices();
        let pinned = PinnedDevices::new(self.knobs.pinned_device_pattern.as_str());
        log_device_stats(cluster, &pinned);

        estimator.initialize(graph)?;
        let estimate = estimator.predict_costs(graph)?;
        log_cost_stats(graph, &estimate);

        let execution_time = estimate.summary.execution_time;
        debug!(
            estimator = estimator.name(),
            execution_time,
            threshold = self.knobs.min_execution_time,
            "predicted execution time"
        );

        let mut result = if execution_time < self.knobs.min_execution_time {
            info!(
                execution_time,
                threshold = self.knobs.min_execution_time,
                "graph too cheap to partition, skipping"
            );
            PlacementResult {
                graph: graph.clone(),
                report: PlacementReport::new(
                    self.name(),
                    graph.id.clone(),
                    PlacementOutcome::Skipped {
                        execution_time,
                        threshold: self.knobs.min_execution_time,
                    },
                ),
            }
        } else {
            self.place(graph, &devices, &estimate)
        };

        result.report.predicted_execution_time = execution_time;
        result.graph.id = graph.id.clone();
        result.graph.versions = graph.versions;

        info!(
            optimizer = self.name(),
            moved = result.report.moved(),
            outcome = ?result.report.outcome,
            "placement finished"
        );
        Ok(result)
    }

    fn feedback(
        &self,
        _cluster: &dyn DeviceInventory,
        graph: &GraphDef,
        _optimized: &GraphDef,
        result: f64,
    ) {
        debug!(
            optimizer = self.name(),
            graph = graph.id.as_deref().unwrap_or("<anonymous>"),
            result,
            "received placement feedback"
        );
    }
}
