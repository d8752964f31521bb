//! Name-to-node and node-to-cost lookup tables for one placement pass.

use placeforge_costs::{CostEstimate, NodeCost};
use placeforge_ir::{GraphDef, OpNode};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Position of a node in the graph's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index over a borrowed graph and its cost estimate.
///
/// Data-input producers are resolved once here so cost evaluation only walks
/// small integer slices.
pub struct CostIndex<'g> {
    graph: &'g GraphDef,
    by_name: HashMap<&'g str, NodeId>,
    costs: Vec<Option<NodeCost>>,
    producers: Vec<Vec<NodeId>>,
}

impl<'g> CostIndex<'g> {
    pub fn build(graph: &'g GraphDef, estimate: &CostEstimate) -> Self {
        let mut by_name = HashMap::with_capacity(graph.len());
        for (position, node) in graph.nodes.iter().enumerate() {
            match by_name.entry(node.name.as_str()) {
                Entry::Occupied(_) => {
                    warn!(node = %node.name, "duplicate node name, keeping first occurrence");
                }
                Entry::Vacant(slot) => {
                    slot.insert(NodeId(position));
                }
            }
        }

        let costs = graph
            .nodes
            .iter()
            .map(|node| estimate.get(&node.name).copied())
            .collect();

        let mut unresolved_inputs = 0;
        let producers = graph
            .nodes
            .iter()
            .map(|node| {
                node.data_inputs()
                    .filter_map(|input| {
                        let producer = by_name.get(input.producer()).copied();
                        if producer.is_none() {
                            unresolved_inputs += 1;
                        }
                        producer
                    })
                    .collect()
            })
            .collect();

        if unresolved_inputs > 0 {
            debug!(unresolved_inputs, "data inputs with unknown producers contribute no cost");
        }

        Self {
            graph,
            by_name,
            costs,
            producers,
        }
    }

    pub fn graph(&self) -> &'g GraphDef {
        self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.graph.len()).map(NodeId)
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> &'g OpNode {
        &self.graph.nodes[id.0]
    }

    pub fn cost(&self, id: NodeId) -> Option<&NodeCost> {
        self.costs[id.0].as_ref()
    }

    pub fn compute_cost(&self, id: NodeId) -> i64 {
        self.cost(id).map(|cost| cost.compute_cost).unwrap_or(0)
    }

    /// Resolved producers of the node's data inputs, in input order.
    pub fn producers(&self, id: NodeId) -> &[NodeId] {
        &self.producers[id.0]
    }
}
