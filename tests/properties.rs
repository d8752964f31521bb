//! Randomized checks of the placement invariants over seeded graphs.

use anyhow::Result;
use placeforge::costs::{CostEstimate, NodeCost};
use placeforge::ir::{GraphBuilder, GraphDef, PinnedDevices};
use placeforge::optimizer::{
    default_placement, LocalSearchPartitioner, OpMetadataProvider, OpRegistry, PartitionOutcome,
    PinnedPolicy,
};
use placeforge::PlacementKnobs;

const OPS: &[&str] = &[
    "MatMul",
    "Add",
    "Mul",
    "ConcatV2",
    "Relu",
    "VariableV2",
    "Const",
    "Mystery",
];
const GRAPH_DEVICES: &[&str] = &[
    "/device:CPU:0",
    "/device:GPU:0",
    "/device:GPU:1",
    "/device:GPU:2",
    "/device:GPU:7",
    "",
];

fn names(devices: &[&str]) -> Vec<String> {
    devices.iter().map(|name| name.to_string()).collect()
}

fn inventory() -> Vec<String> {
    names(&["/device:CPU:0", "/device:GPU:0", "/device:GPU:1", "/device:GPU:2"])
}

fn random_graph(rng: &mut fastrand::Rng, nodes: usize) -> Result<(GraphDef, CostEstimate)> {
    let mut builder = GraphBuilder::new().with_id(format!("random-{}", nodes));
    let mut estimate = CostEstimate::default();
    for i in 0..nodes {
        let name = format!("n{}", i);
        let op = OPS[rng.usize(..OPS.len())];
        let device = GRAPH_DEVICES[rng.usize(..GRAPH_DEVICES.len())];

        let mut inputs = Vec::new();
        if i > 0 {
            for _ in 0..rng.usize(0..4) {
                let producer = rng.usize(..i);
                let input = match rng.u8(0..10) {
                    0 => format!("^n{}", producer),
                    1 => format!("n{}:1", producer),
                    _ => format!("n{}", producer),
                };
                inputs.push(input);
            }
        }
        let inputs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        builder = builder.add_op(name.as_str(), op, device, &inputs);

        // Leave a few nodes without a cost entry.
        if rng.u8(0..10) > 0 {
            estimate.nodes.insert(
                name,
                NodeCost::new(rng.i64(0..100), rng.i64(0..1_000)),
            );
        }
    }
    Ok((builder.build()?, estimate))
}

fn is_movable(
    graph: &GraphDef,
    name: &str,
    knobs: &PlacementKnobs,
    registry: &OpRegistry,
    pinned: &PinnedDevices,
) -> bool {
    let Some(node) = graph.node(name) else {
        return false;
    };
    knobs.is_relocatable(&node.op)
        && registry
            .lookup(&node.op)
            .map_or(false, |metadata| !metadata.is_stateful)
        && node.has_device()
        && !pinned.is_pinned(&node.device)
}

fn partition(
    knobs: &PlacementKnobs,
    graph: &GraphDef,
    inventory: &[String],
    estimate: &CostEstimate,
) -> PartitionOutcome {
    let registry = OpRegistry::with_default_ops();
    LocalSearchPartitioner::new(knobs, &registry).partition(graph, inventory, estimate)
}

fn check_outcome(
    knobs: &PlacementKnobs,
    graph: &GraphDef,
    inventory: &[String],
    outcome: &PartitionOutcome,
) -> Result<()> {
    let registry = OpRegistry::with_default_ops();
    let pinned = PinnedDevices::new(knobs.pinned_device_pattern.as_str());
    // Even split over the whole inventory, pinned devices included.
    let ideal_share = 1.0 / inventory.len() as f64;
    assert!((outcome.ideal_share - ideal_share).abs() < 1e-12);

    // Compute conservation.
    let before: i64 = outcome.device_loads.iter().map(|load| load.load_before).sum();
    let after: i64 = outcome.device_loads.iter().map(|load| load.load_after).sum();
    assert_eq!(before, outcome.total_compute_cost);
    assert_eq!(after, outcome.total_compute_cost);

    // Only eligible nodes move, and only onto non-pinned inventory devices.
    assert_eq!(outcome.graph.len(), graph.len());
    let mut changed = 0;
    for (original, placed) in graph.nodes.iter().zip(&outcome.graph.nodes) {
        assert_eq!(original.name, placed.name);
        assert_eq!(original.op, placed.op);
        assert_eq!(original.inputs, placed.inputs);
        if original.device == placed.device {
            continue;
        }
        changed += 1;
        assert!(
            is_movable(graph, &original.name, knobs, &registry, &pinned),
            "{} ({}) on {:?} should not have moved",
            original.name,
            original.op,
            original.device
        );
        assert!(inventory.contains(&placed.device));
        assert!(!pinned.is_pinned(&placed.device));
    }
    assert_eq!(changed, outcome.moved);

    // Every accepted move strictly improves the node and respects the margin.
    for mv in &outcome.moves {
        assert!(mv.delta_after < mv.delta_before, "{:?}", mv);
        for share in [mv.origin_share, mv.destination_share] {
            assert!(
                (share - ideal_share).abs() <= knobs.compute_margin + 1e-9,
                "share {} outside margin for {:?}",
                share,
                mv
            );
        }
        assert!(!pinned.is_pinned(&mv.to));
    }
    Ok(())
}

#[test]
fn random_graphs_keep_placement_invariants() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(0x5eed_cafe);
    for round in 0..200 {
        let nodes = rng.usize(1..40);
        let (graph, estimate) = random_graph(&mut rng, nodes)?;
        let margin = [0.0, 0.05, 0.2, 0.5, 1.0][round % 5];
        let policy = if round % 2 == 0 {
            PinnedPolicy::Strict
        } else {
            PinnedPolicy::Lenient
        };
        let knobs = PlacementKnobs {
            pinned_policy: policy,
            ..PlacementKnobs::always_optimize().with_compute_margin(margin)
        };

        let inventory = inventory();
        let outcome = partition(&knobs, &graph, &inventory, &estimate);
        check_outcome(&knobs, &graph, &inventory, &outcome)?;
    }
    Ok(())
}

#[test]
fn three_device_inventory_with_pinned_cpu_keeps_shares_near_a_third() -> Result<()> {
    let inventory = names(&["/device:CPU:0", "/device:GPU:0", "/device:GPU:1"]);
    let mut rng = fastrand::Rng::with_seed(0x3d3);
    let mut accepted = 0;
    for round in 0..200 {
        let nodes = rng.usize(2..40);
        let (graph, mut estimate) = random_graph(&mut rng, nodes)?;
        // Uneven initial load: GPU:0 nodes weigh three times as much.
        for node in &graph.nodes {
            if let Some(cost) = estimate.nodes.get_mut(&node.name) {
                if node.device.ends_with("GPU:0") {
                    cost.compute_cost *= 3;
                }
            }
        }
        let margin = [0.2, 0.4, 0.6][round % 3];
        let knobs = PlacementKnobs::always_optimize().with_compute_margin(margin);
        let outcome = partition(&knobs, &graph, &inventory, &estimate);
        check_outcome(&knobs, &graph, &inventory, &outcome)?;
        accepted += outcome.moves.len();
    }
    assert!(accepted > 0);
    Ok(())
}

#[test]
fn input_graph_is_never_modified() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(7);
    let (graph, estimate) = random_graph(&mut rng, 30)?;
    let snapshot = graph.clone();
    let knobs = PlacementKnobs::always_optimize().with_compute_margin(1.0);
    let _ = partition(&knobs, &graph, &inventory(), &estimate);
    assert_eq!(graph, snapshot);
    Ok(())
}

#[test]
fn default_placement_is_idempotent_on_random_graphs() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(42);
    let registry = OpRegistry::with_default_ops();
    let knobs = PlacementKnobs::default();
    for _ in 0..100 {
        let nodes = rng.usize(1..30);
        let (graph, _) = random_graph(&mut rng, nodes)?;
        let once = default_placement(&graph, &inventory(), &knobs, &registry);
        let twice = default_placement(&once.graph, &inventory(), &knobs, &registry);
        assert_eq!(twice.moved, 0);
        assert_eq!(twice.graph, once.graph);
        assert_eq!(once.default_device.as_deref(), Some("/device:GPU:0"));
    }
    Ok(())
}

#[test]
fn zero_margin_only_accepts_exact_shares() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..50 {
        let nodes = rng.usize(2..25);
        let (graph, mut estimate) = random_graph(&mut rng, nodes)?;
        for cost in estimate.nodes.values_mut() {
            cost.compute_cost = cost.compute_cost.max(1);
        }
        let knobs = PlacementKnobs::always_optimize().with_compute_margin(0.0);
        let inventory = inventory();
        let ideal_share = 1.0 / inventory.len() as f64;
        let outcome = partition(&knobs, &graph, &inventory, &estimate);
        for mv in &outcome.moves {
            assert!((mv.origin_share - ideal_share).abs() <= 1e-9);
            assert!((mv.destination_share - ideal_share).abs() <= 1e-9);
        }
    }
    Ok(())
}
