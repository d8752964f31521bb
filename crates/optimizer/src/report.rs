//! Placement reports.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One accepted relocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub node: String,
    pub from: String,
    pub to: String,
    /// `external - internal` cost on the origin device.
    pub delta_before: i64,
    /// `external - internal` cost on the destination device.
    pub delta_after: i64,
    /// Compute share of the origin device after the move.
    pub origin_share: f64,
    /// Compute share of the destination device after the move.
    pub destination_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLoad {
    pub device: String,
    pub pinned: bool,
    pub load_before: i64,
    pub load_after: i64,
    pub share_after: f64,
}

/// What the optimizer did with the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum PlacementOutcome {
    /// Predicted runtime below the threshold; graph returned unchanged.
    Skipped { execution_time: i64, threshold: i64 },
    LocalSearch { moved: usize },
    DefaultDevice { device: String, moved: usize },
    /// No non-pinned device in the inventory; graph returned unchanged.
    NoTargetDevice,
}

impl PlacementOutcome {
    pub fn moved(&self) -> usize {
        match self {
            PlacementOutcome::LocalSearch { moved } => *moved,
            PlacementOutcome::DefaultDevice { moved, .. } => *moved,
            PlacementOutcome::Skipped { .. } | PlacementOutcome::NoTargetDevice => 0,
        }
    }
}

/// Complete report for one optimizer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub optimizer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,

    #[serde(flatten)]
    pub outcome: PlacementOutcome,

    /// Estimator's predicted execution time for the input graph.
    pub predicted_execution_time: i64,

    pub eligible_nodes: usize,

    pub total_compute_cost: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_cost_before: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_cost_after: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_loads: Vec<DeviceLoad>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<MoveRecord>,
}

impl PlacementReport {
    pub fn new(optimizer: &str, graph_id: Option<String>, outcome: PlacementOutcome) -> Self {
        Self {
            optimizer: optimizer.to_string(),
            graph_id,
            outcome,
            predicted_execution_time: 0,
            eligible_nodes: 0,
            total_compute_cost: 0,
            external_cost_before: None,
            external_cost_after: None,
            device_loads: Vec::new(),
            moves: Vec::new(),
        }
    }

    pub fn moved(&self) -> usize {
        self.outcome.moved()
    }

    /// Save report to JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load report from JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let report = PlacementReport::new(
            "placement",
            Some("item-3".into()),
            PlacementOutcome::DefaultDevice {
                device: "/device:GPU:0".into(),
                moved: 4,
            },
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"outcome\":\"default-device\""));
        assert!(!json.contains("moves"));

        let parsed: PlacementReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.moved(), 4);
    }

    #[test]
    fn test_skipped_moves_nothing() {
        let outcome = PlacementOutcome::Skipped {
            execution_time: 10,
            threshold: 100,
        };
        assert_eq!(outcome.moved(), 0);
        assert_eq!(PlacementOutcome::NoTargetDevice.moved(), 0);
    }
}
