//! Placement knobs - tunable parameters for the placement pass.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which placement routine runs once the graph is worth optimizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// Single-sweep local search balancing communication and compute.
    #[default]
    LocalSearch,
    /// Collapse every relocatable node onto the default device.
    DefaultDevice,
}

impl PlacementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStrategy::LocalSearch => "local-search",
            PlacementStrategy::DefaultDevice => "default-device",
        }
    }
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local-search" | "local_search" | "partition" => Ok(PlacementStrategy::LocalSearch),
            "default-device" | "default_device" | "default" => Ok(PlacementStrategy::DefaultDevice),
            other => Err(format!("unknown placement strategy: {}", other)),
        }
    }
}

/// How nodes already sitting on a pinned device are treated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PinnedPolicy {
    /// Nodes on pinned devices are not eligible at all.
    #[default]
    Strict,
    /// Nodes on pinned devices count towards the load table but never move.
    Lenient,
}

/// Tunable parameters for the placement pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementKnobs {
    /// Allowed deviation of a device's compute share from the even split.
    pub compute_margin: f64,
    /// Graphs predicted to run faster than this (ns) are left untouched.
    pub min_execution_time: i64,
    pub strategy: PlacementStrategy,
    /// Devices whose name contains this pattern are never move targets.
    pub pinned_device_pattern: String,
    pub pinned_policy: PinnedPolicy,
    /// Op types that are safe to relocate.
    pub relocatable_ops: Vec<String>,
}

impl Default for PlacementKnobs {
    fn default() -> Self {
        Self {
            compute_margin: 0.2,
            min_execution_time: 1_000_000,
            strategy: PlacementStrategy::LocalSearch,
            pinned_device_pattern: "CPU".into(),
            pinned_policy: PinnedPolicy::Strict,
            relocatable_ops: ["MatMul", "Add", "Mul", "ConcatV2"]
                .iter()
                .map(|op| op.to_string())
                .collect(),
        }
    }
}

impl PlacementKnobs {
    /// Knobs that always optimize, regardless of predicted runtime.
    pub fn always_optimize() -> Self {
        Self {
            min_execution_time: 0,
            ..Default::default()
        }
    }

    pub fn with_compute_margin(mut self, compute_margin: f64) -> Self {
        self.compute_margin = compute_margin;
        self
    }

    pub fn with_strategy(mut self, strategy: PlacementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn is_relocatable(&self, op: &str) -> bool {
        self.relocatable_ops.iter().any(|candidate| candidate == op)
    }

    /// Validate that knobs are within reasonable bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !self.compute_margin.is_finite() || !(0.0..=1.0).contains(&self.compute_margin) {
            return Err(format!(
                "compute_margin must be within [0, 1], got {}",
                self.compute_margin
            ));
        }
        if self.min_execution_time < 0 {
            return Err("min_execution_time must be >= 0".into());
        }
        if self.pinned_device_pattern.is_empty() {
            return Err("pinned_device_pattern must not be empty".into());
        }
        if self.relocatable_ops.is_empty() {
            return Err("relocatable_ops must name at least one op".into());
        }
        Ok(())
    }

    /// Apply `PLACEFORGE_COMPUTE_MARGIN`, `PLACEFORGE_MIN_EXECUTION_TIME` and
    /// `PLACEFORGE_STRATEGY` when set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var("PLACEFORGE_COMPUTE_MARGIN") {
            self.compute_margin = value
                .parse()
                .map_err(|_| anyhow!("PLACEFORGE_COMPUTE_MARGIN is not a number: {}", value))?;
        }
        if let Ok(value) = std::env::var("PLACEFORGE_MIN_EXECUTION_TIME") {
            self.min_execution_time = value.parse().map_err(|_| {
                anyhow!("PLACEFORGE_MIN_EXECUTION_TIME is not an integer: {}", value)
            })?;
        }
        if let Ok(value) = std::env::var("PLACEFORGE_STRATEGY") {
            self.strategy = value.parse().map_err(|err: String| anyhow!(err))?;
        }
        Ok(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
