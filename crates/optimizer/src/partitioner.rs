//! Single-sweep local search over eligible nodes.
//!
//! Every eligible node is visited once, in graph order. For each node the
//! candidate devices are tried in inventory order and a candidate is accepted
//! as soon as it lowers the node's cut contribution without pushing the origin
//! or destination outside the compute margin. Later candidates for the same
//! node are compared against the last accepted one. The node's device is
//! committed once, after all candidates were tried.

use crate::assignment::{Assignments, DeviceTable};
use crate::balance::{BalanceTracker, Move};
use crate::comm_cost::{comm_cost, total_external_cost};
use crate::cost_index::{CostIndex, NodeId};
use crate::eligibility::EligibilityFilter;
use crate::knobs::PlacementKnobs;
use crate::metadata::OpMetadataProvider;
use crate::report::{DeviceLoad, MoveRecord};
use placeforge_costs::CostEstimate;
use placeforge_ir::{GraphDef, PinnedDevices};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    pub graph: GraphDef,
    /// Nodes whose device changed.
    pub moved: usize,
    /// Every accepted move, in acceptance order.
    pub moves: Vec<MoveRecord>,
    pub eligible: usize,
    pub total_compute_cost: i64,
    pub ideal_share: f64,
    pub device_loads: Vec<DeviceLoad>,
    pub external_cost_before: i64,
    pub external_cost_after: i64,
}

pub struct LocalSearchPartitioner<'a> {
    knobs: &'a PlacementKnobs,
    metadata: &'a dyn OpMetadataProvider,
}

impl<'a> LocalSearchPartitioner<'a> {
    pub fn new(knobs: &'a PlacementKnobs, metadata: &'a dyn OpMetadataProvider) -> Self {
        Self { knobs, metadata }
    }

    pub fn partition(
        &self,
        graph: &GraphDef,
        devices: &[String],
        estimate: &CostEstimate,
    ) -> PartitionOutcome {
        let pinned = PinnedDevices::new(self.knobs.pinned_device_pattern.as_str());
        let index = CostIndex::build(graph, estimate);
        let mut table = DeviceTable::new(devices);
        let mut assignments = Assignments::from_graph(graph, &mut table);
        let candidates = table.candidates(&pinned);

        let filter = EligibilityFilter::new(self.metadata, self.knobs, &pinned);
        let eligible: Vec<NodeId> = index
            .node_ids()
            .filter(|id| filter.is_eligible(index.node(*id)))
            .collect();

        let mut tracker =
            BalanceTracker::new(table.num_devices(), devices.len(), self.knobs.compute_margin);
        for &node in &eligible {
            if let Some(device) = assignments.device(node) {
                tracker.add(device, index.compute_cost(node));
            }
        }
        let loads_before = tracker.loads().to_vec();
        let external_cost_before = total_external_cost(&index, &assignments);

        debug!(
            pass = "local-search",
            nodes = index.len(),
            eligible = eligible.len(),
            candidates = candidates.len(),
            total_compute_cost = tracker.total(),
            external_cost = external_cost_before,
            "starting placement sweep"
        );

        let mut moves = Vec::new();
        let mut moved = 0;

        if candidates.len() < 2 || eligible.is_empty() {
            debug!(pass = "local-search", "fewer than two candidate devices or nothing eligible");
        } else {
            for &node in &eligible {
                let Some(origin) = assignments.device(node) else {
                    continue;
                };
                if pinned.is_pinned(table.name(origin)) {
                    continue;
                }

                let compute_cost = index.compute_cost(node);
                let mut current = origin;
                let mut current_cost = comm_cost(&index, &assignments, node, origin);

                for &candidate in &candidates {
                    if candidate == origin || candidate == current {
                        continue;
                    }
                    let candidate_cost = comm_cost(&index, &assignments, node, candidate);
                    let mv = Move {
                        compute_cost,
                        before: current_cost,
                        after: candidate_cost,
                        origin: current,
                        destination: candidate,
                    };
                    if !tracker.is_beneficial(&mv) {
                        continue;
                    }

                    tracker.apply(&mv);
                    let record = MoveRecord {
                        node: index.node(node).name.clone(),
                        from: table.name(current).to_string(),
                        to: table.name(candidate).to_string(),
                        delta_before: current_cost.delta(),
                        delta_after: candidate_cost.delta(),
                        origin_share: tracker.share(current),
                        destination_share: tracker.share(candidate),
                    };
                    trace!(
                        node = %record.node,
                        from = %record.from,
                        to = %record.to,
                        delta_before = record.delta_before,
                        delta_after = record.delta_after,
                        "accepted move"
                    );
                    moves.push(record);
                    current = candidate;
                    current_cost = candidate_cost;
                }

                if current != origin {
                    assignments.assign(node, current);
                    moved += 1;
                }
            }
        }

        let external_cost_after = total_external_cost(&index, &assignments);
        debug_assert!(tracker.is_conserved());
        debug!(
            pass = "local-search",
            moved,
            accepted_moves = moves.len(),
            external_cost_before,
            external_cost_after,
            "placement sweep finished"
        );

        let device_loads = table
            .ids()
            .map(|device| DeviceLoad {
                device: table.name(device).to_string(),
                pinned: pinned.is_pinned(table.name(device)),
                load_before: loads_before[device.0],
                load_after: tracker.load(device),
                share_after: tracker.share(device),
            })
            .collect();

        PartitionOutcome {
            graph: assignments.apply(&index, &table),
            moved,
            moves,
            eligible: eligible.len(),
            total_compute_cost: tracker.total(),
            ideal_share: tracker.ideal_share(),
            device_loads,
            external_cost_before,
            external_cost_after,
        }
    }
}
