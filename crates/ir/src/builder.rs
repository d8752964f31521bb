//! Graph builder entrypoints and helpers.

use crate::graph::{GraphDef, NodeInput, OpNode, VersionDef};
use anyhow::{anyhow, bail, Result};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct PendingNode {
    name: String,
    op: String,
    device: String,
    inputs: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    id: Option<String>,
    versions: VersionDef,
    nodes: Vec<PendingNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id<N: Into<String>>(mut self, id: N) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_versions(mut self, producer: i32, min_consumer: i32) -> Self {
        self.versions = VersionDef {
            producer,
            min_consumer,
        };
        self
    }

    /// Adds an operation. Inputs use the text form: `"x"`, `"x:1"`, `"^x"`.
    pub fn add_op<N, O, D>(mut self, name: N, op: O, device: D, inputs: &[&str]) -> Self
    where
        N: Into<String>,
        O: Into<String>,
        D: Into<String>,
    {
        self.nodes.push(PendingNode {
            name: name.into(),
            op: op.into(),
            device: device.into(),
            inputs: inputs.iter().map(|input| input.to_string()).collect(),
        });
        self
    }

    pub fn add_matmul<N, D>(self, name: N, device: D, lhs: &str, rhs: &str) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.add_op(name, "MatMul", device, &[lhs, rhs])
    }

    pub fn add_placeholder<N, D>(self, name: N, device: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        self.add_op(name, "Placeholder", device, &[])
    }

    /// Parses the inputs and rejects duplicate node names.
    pub fn build(self) -> Result<GraphDef> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for pending in self.nodes {
            if !seen.insert(pending.name.clone()) {
                bail!("duplicate node name '{}'", pending.name);
            }
            let inputs = pending
                .inputs
                .iter()
                .map(|text| {
                    text.parse::<NodeInput>()
                        .map_err(|err| anyhow!("node '{}': {}", pending.name, err))
                })
                .collect::<Result<Vec<_>>>()?;
            nodes.push(OpNode {
                name: pending.name,
                op: pending.op,
                device: pending.device,
                inputs,
            });
        }

        Ok(GraphDef {
            id: self.id,
            versions: self.versions,
            nodes,
        })
    }
}

impl GraphDef {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Fails if any input names a producer that is not in the graph.
    pub fn validate_references(&self) -> Result<()> {
        let names: HashSet<&str> = self.nodes.iter().map(|node| node.name.as_str()).collect();
        for node in &self.nodes {
            for input in &node.inputs {
                if !names.contains(input.producer()) {
                    bail!(
                        "node '{}' references unknown producer '{}'",
                        node.name,
                        input.producer()
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_parses_inputs() -> Result<()> {
        let graph = GraphBuilder::new()
            .with_versions(27, 12)
            .add_placeholder("x", "/device:GPU:0")
            .add_placeholder("w", "/device:GPU:0")
            .add_matmul("mm", "/device:GPU:1", "x", "w:0")
            .add_op("out", "Identity", "", &["mm", "^x"])
            .build()?;

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.versions.producer, 27);
        let out = graph.node("out").unwrap();
        assert_eq!(out.num_data_inputs(), 1);
        assert_eq!(out.num_control_inputs(), 1);
        graph.validate_references()?;
        Ok(())
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = GraphBuilder::new()
            .add_placeholder("x", "")
            .add_placeholder("x", "")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_dangling_reference_detected() -> Result<()> {
        let graph = GraphBuilder::new()
            .add_op("y", "Relu", "", &["missing"])
            .build()?;
        assert!(graph.validate_references().is_err());
        Ok(())
    }
}
