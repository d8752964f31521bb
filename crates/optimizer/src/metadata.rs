//! Operation metadata lookup.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpMetadata {
    pub is_stateful: bool,
}

/// Answers whether an op type is known and whether it holds state.
pub trait OpMetadataProvider: Send + Sync {
    fn lookup(&self, op: &str) -> Option<OpMetadata>;
}

/// Map-backed op registry.
#[derive(Debug, Clone, Default)]
pub struct OpRegistry {
    ops: HashMap<String, OpMetadata>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    pub fn with_default_ops() -> Self {
        let mut registry = Self::new();
        for op in [
            "MatMul",
            "Add",
            "AddV2",
            "Mul",
            "Sub",
            "ConcatV2",
            "Relu",
            "Softmax",
            "Identity",
            "Const",
            "Placeholder",
            "NoOp",
        ] {
            registry.register(op, OpMetadata { is_stateful: false });
        }
        for op in [
            "Variable",
            "VariableV2",
            "VarHandleOp",
            "Assign",
            "AssignVariableOp",
            "ReadVariableOp",
        ] {
            registry.register(op, OpMetadata { is_stateful: true });
        }
        registry
    }

    pub fn register<O: Into<String>>(&mut self, op: O, metadata: OpMetadata) {
        self.ops.insert(op.into(), metadata);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl OpMetadataProvider for OpRegistry {
    fn lookup(&self, op: &str) -> Option<OpMetadata> {
        self.ops.get(op).copied()
    }
}

impl OpMetadataProvider for HashMap<String, OpMetadata> {
    fn lookup(&self, op: &str) -> Option<OpMetadata> {
        self.get(op).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = OpRegistry::with_default_ops();
        assert_eq!(registry.lookup("MatMul"), Some(OpMetadata { is_stateful: false }));
        assert_eq!(registry.lookup("VariableV2"), Some(OpMetadata { is_stateful: true }));
        assert_eq!(registry.lookup("FancyOp"), None);
    }

    #[test]
    fn test_plain_map_is_a_provider() {
        let mut ops = HashMap::new();
        ops.insert("Custom".to_string(), OpMetadata { is_stateful: true });
        assert!(ops.lookup("Custom").unwrap().is_stateful);
    }
}
