//! Coarse fallback: move every relocatable node onto one device.

use crate::eligibility::EligibilityFilter;
use crate::knobs::{PinnedPolicy, PlacementKnobs};
use crate::metadata::OpMetadataProvider;
use placeforge_ir::{GraphDef, PinnedDevices};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct DefaultPlacementOutcome {
    pub graph: GraphDef,
    /// `None` when the inventory holds no non-pinned device.
    pub default_device: Option<String>,
    pub moved: usize,
    pub eligible: usize,
}

/// Reassigns every eligible node that is neither pinned nor already on the
/// default device (the first non-pinned inventory device).
pub fn default_placement(
    graph: &GraphDef,
    devices: &[String],
    knobs: &PlacementKnobs,
    metadata: &dyn OpMetadataProvider,
) -> DefaultPlacementOutcome {
    let pinned = PinnedDevices::new(knobs.pinned_device_pattern.as_str());

    let referenced = graph.referenced_devices();
    let pinned_referenced: Vec<&str> = referenced
        .iter()
        .copied()
        .filter(|device| pinned.is_pinned(device))
        .collect();
    debug!(
        pass = "default-placement",
        referenced = ?referenced,
        pinned = ?pinned_referenced,
        "devices referenced by graph"
    );

    let Some(default_device) = pinned.default_device(devices) else {
        warn!(
            pass = "default-placement",
            devices = devices.len(),
            pattern = pinned.pattern(),
            "no eligible target device, leaving graph unchanged"
        );
        return DefaultPlacementOutcome {
            graph: graph.clone(),
            default_device: None,
            moved: 0,
            eligible: 0,
        };
    };

    let filter =
        EligibilityFilter::new(metadata, knobs, &pinned).with_policy(PinnedPolicy::Strict);
    let mut placed = graph.clone();
    let mut moved = 0;
    let mut eligible = 0;
    for node in placed.nodes.iter_mut() {
        if !filter.is_eligible(node) {
            continue;
        }
        eligible += 1;
        if node.device != default_device {
            node.device = default_device.to_string();
            moved += 1;
        }
    }

    debug!(
        pass = "default-placement",
        device = default_device,
        eligible,
        moved,
        "collapsed relocatable nodes onto default device"
    );

    DefaultPlacementOutcome {
        graph: placed,
        default_device: Some(default_device.to_string()),
        moved,
        eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::OpRegistry;
    use placeforge_ir::GraphBuilder;

    fn inventory() -> Vec<String> {
        ["/device:CPU:0", "/device:GPU:0", "/device:GPU:1"]
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn graph() -> GraphDef {
        GraphBuilder::new()
            .add_op("v", "VariableV2", "/device:GPU:1", &[])
            .add_op("cpu_mm", "MatMul", "/device:CPU:0", &[])
            .add_op("mm", "MatMul", "/device:GPU:1", &["v", "cpu_mm"])
            .add_op("add", "Add", "/device:GPU:0", &["mm"])
            .add_op("unplaced", "Mul", "", &["add"])
            .add_op("relu", "Relu", "/device:GPU:1", &["add"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_collapses_onto_first_non_pinned() {
        let registry = OpRegistry::with_default_ops();
        let knobs = PlacementKnobs::default();
        let outcome = default_placement(&graph(), &inventory(), &knobs, &registry);

        assert_eq!(outcome.default_device.as_deref(), Some("/device:GPU:0"));
        assert_eq!(outcome.moved, 1);
        assert_eq!(outcome.eligible, 2);
        let placed = &outcome.graph;
        assert_eq!(placed.node("mm").unwrap().device, "/device:GPU:0");
        assert_eq!(placed.node("v").unwrap().device, "/device:GPU:1");
        assert_eq!(placed.node("cpu_mm").unwrap().device, "/device:CPU:0");
        assert_eq!(placed.node("unplaced").unwrap().device, "");
        assert_eq!(placed.node("relu").unwrap().device, "/device:GPU:1");
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let registry = OpRegistry::with_default_ops();
        let knobs = PlacementKnobs::default();
        let once = default_placement(&graph(), &inventory(), &knobs, &registry);
        let twice = default_placement(&once.graph, &inventory(), &knobs, &registry);
        assert_eq!(twice.moved, 0);
        assert_eq!(twice.graph, once.graph);
    }

    #[test]
    fn test_pinned_only_inventory_is_identity() {
        let registry = OpRegistry::with_default_ops();
        let knobs = PlacementKnobs::default();
        let devices = vec!["/device:CPU:0".to_string()];
        let outcome = default_placement(&graph(), &devices, &knobs, &registry);
        assert!(outcome.default_device.is_none());
        assert_eq!(outcome.graph, graph());
    }
}
