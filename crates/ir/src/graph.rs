//! Graph model consumed by the placement passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single input reference of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeInput {
    /// Tensor flowing from `producer`'s output `port`.
    Data { producer: String, port: usize },
    /// Ordering-only dependency, carries no data.
    Control { producer: String },
}

impl NodeInput {
    pub fn data<N: Into<String>>(producer: N) -> Self {
        NodeInput::Data {
            producer: producer.into(),
            port: 0,
        }
    }

    pub fn control<N: Into<String>>(producer: N) -> Self {
        NodeInput::Control {
            producer: producer.into(),
        }
    }

    pub fn producer(&self) -> &str {
        match self {
            NodeInput::Data { producer, .. } => producer,
            NodeInput::Control { producer } => producer,
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, NodeInput::Control { .. })
    }
}

impl fmt::Display for NodeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeInput::Data { producer, port: 0 } => write!(f, "{}", producer),
            NodeInput::Data { producer, port } => write!(f, "{}:{}", producer, port),
            NodeInput::Control { producer } => write!(f, "^{}", producer),
        }
    }
}

impl FromStr for NodeInput {
    type Err = String;

    /// Parses `"^name"` (control), `"name"` or `"name:port"` (data).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(producer) = s.strip_prefix('^') {
            if producer.is_empty() {
                return Err("control input without producer name".into());
            }
            return Ok(NodeInput::control(producer));
        }
        if s.is_empty() {
            return Err("empty input reference".into());
        }
        match s.rsplit_once(':') {
            Some((producer, port)) if !producer.is_empty() => {
                let port = port
                    .parse::<usize>()
                    .map_err(|_| format!("invalid output port in input '{}'", s))?;
                Ok(NodeInput::Data {
                    producer: producer.to_string(),
                    port,
                })
            }
            Some(_) => Err(format!("invalid input reference '{}'", s)),
            None => Ok(NodeInput::data(s)),
        }
    }
}

/// One operation of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpNode {
    pub name: String,
    pub op: String,
    /// Assigned device; empty means unassigned.
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub inputs: Vec<NodeInput>,
}

impl OpNode {
    pub fn new<N: Into<String>, O: Into<String>>(name: N, op: O) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            device: String::new(),
            inputs: Vec::new(),
        }
    }

    pub fn has_device(&self) -> bool {
        !self.device.is_empty()
    }

    pub fn data_inputs(&self) -> impl Iterator<Item = &NodeInput> {
        self.inputs.iter().filter(|input| !input.is_control())
    }

    pub fn num_data_inputs(&self) -> usize {
        self.data_inputs().count()
    }

    pub fn num_control_inputs(&self) -> usize {
        self.inputs.len() - self.num_data_inputs()
    }
}

/// Graph-level versioning metadata, copied through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDef {
    pub producer: i32,
    pub min_consumer: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDef {
    /// Identifier of the item being optimized, used for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub versions: VersionDef,
    pub nodes: Vec<OpNode>,
}

impl GraphDef {
    pub fn new(nodes: Vec<OpNode>) -> Self {
        Self {
            id: None,
            versions: VersionDef::default(),
            nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&OpNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut OpNode> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    /// Distinct non-empty devices referenced by the nodes, sorted.
    pub fn referenced_devices(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .filter(|node| node.has_device())
            .map(|node| node.device.as_str())
            .collect()
    }

    /// Copy of this graph's metadata with a new node list.
    pub fn with_nodes(&self, nodes: Vec<OpNode>) -> Self {
        Self {
            id: self.id.clone(),
            versions: self.versions,
            nodes,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_references() {
        assert_eq!("a".parse::<NodeInput>().unwrap(), NodeInput::data("a"));
        assert_eq!(
            "mm:2".parse::<NodeInput>().unwrap(),
            NodeInput::Data {
                producer: "mm".into(),
                port: 2
            }
        );
        assert_eq!("^init".parse::<NodeInput>().unwrap(), NodeInput::control("init"));
        assert!("^".parse::<NodeInput>().is_err());
        assert!("".parse::<NodeInput>().is_err());
        assert!("x:y".parse::<NodeInput>().is_err());
    }

    #[test]
    fn test_input_display_matches_parse() {
        for text in ["a", "b:1", "^c"] {
            let input: NodeInput = text.parse().unwrap();
            assert_eq!(input.to_string(), text);
        }
    }

    #[test]
    fn test_data_and_control_counts() {
        let mut node = OpNode::new("add", "Add");
        node.inputs = vec![
            NodeInput::data("x"),
            NodeInput::data("y"),
            NodeInput::control("init"),
        ];
        assert_eq!(node.num_data_inputs(), 2);
        assert_eq!(node.num_control_inputs(), 1);
    }

    #[test]
    fn test_referenced_devices_skips_unassigned() {
        let mut a = OpNode::new("a", "MatMul");
        a.device = "/device:GPU:0".into();
        let b = OpNode::new("b", "MatMul");
        let graph = GraphDef::new(vec![a, b]);
        let devices = graph.referenced_devices();
        assert_eq!(devices.len(), 1);
        assert!(devices.contains("/device:GPU:0"));
    }

    #[test]
    fn test_graph_json_keeps_versions() {
        let mut graph = GraphDef::new(vec![OpNode::new("a", "Const")]);
        graph.versions = VersionDef {
            producer: 27,
            min_consumer: 12,
        };
        let parsed = GraphDef::from_json(&graph.to_json().unwrap()).unwrap();
        assert_eq!(parsed, graph);
    }
}
