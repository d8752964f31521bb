//! Interned devices and the per-pass node-to-device table.

use crate::cost_index::{CostIndex, NodeId};
use placeforge_ir::{GraphDef, PinnedDevices};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

/// Device names interned for one pass. Inventory devices come first, in
/// inventory order, followed by devices only the graph mentions.
#[derive(Debug, Clone, Default)]
pub struct DeviceTable {
    names: Vec<String>,
    ids: HashMap<String, DeviceId>,
    inventory_len: usize,
}

impl DeviceTable {
    pub fn new(inventory: &[String]) -> Self {
        let mut table = Self::default();
        for device in inventory {
            table.intern(device);
        }
        table.inventory_len = table.names.len();
        table
    }

    pub fn intern(&mut self, device: &str) -> DeviceId {
        if let Some(id) = self.ids.get(device) {
            return *id;
        }
        let id = DeviceId(self.names.len());
        self.names.push(device.to_string());
        self.ids.insert(device.to_string(), id);
        id
    }

    pub fn name(&self, id: DeviceId) -> &str {
        &self.names[id.0]
    }

    /// Interned devices, inventory and graph-only alike.
    pub fn num_devices(&self) -> usize {
        self.names.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> {
        (0..self.names.len()).map(DeviceId)
    }

    /// Non-pinned inventory devices, in inventory order.
    pub fn candidates(&self, pinned: &PinnedDevices) -> Vec<DeviceId> {
        (0..self.inventory_len)
            .map(DeviceId)
            .filter(|id| !pinned.is_pinned(self.name(*id)))
            .collect()
    }
}

/// Current device of every node; `None` for unassigned nodes.
#[derive(Debug, Clone)]
pub struct Assignments {
    devices: Vec<Option<DeviceId>>,
}

impl Assignments {
    pub fn from_graph(graph: &GraphDef, table: &mut DeviceTable) -> Self {
        let devices = graph
            .nodes
            .iter()
            .map(|node| node.has_device().then(|| table.intern(&node.device)))
            .collect();
        Self { devices }
    }

    pub fn device(&self, node: NodeId) -> Option<DeviceId> {
        self.devices[node.0]
    }

    pub fn assign(&mut self, node: NodeId, device: DeviceId) {
        self.devices[node.0] = Some(device);
    }

    /// Writes the table into a copy of the indexed graph.
    pub fn apply(&self, index: &CostIndex<'_>, table: &DeviceTable) -> GraphDef {
        let graph = index.graph();
        let nodes = graph
            .nodes
            .iter()
            .zip(&self.devices)
            .map(|(node, device)| {
                let mut node = node.clone();
                if let Some(device) = device {
                    node.device = table.name(*device).to_string();
                }
                node
            })
            .collect();
        graph.with_nodes(nodes)
    }
}
