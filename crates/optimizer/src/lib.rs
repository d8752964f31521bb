//! Cost-aware device placement for computation graphs.
//!
//! The placement optimizer assigns relocatable operations to devices so that
//! cross-device traffic shrinks while every device keeps a compute share close
//! to an even split.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────────┐
//! │  CostIndex   │────▶│  Eligibility     │────▶│  LocalSearch       │
//! │  (per pass)  │     │  Filter          │     │  + BalanceTracker  │
//! └──────────────┘     └──────────────────┘     └────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`knobs::PlacementKnobs`]: margin, skip threshold, strategy, whitelist
//! - [`eligibility::EligibilityFilter`]: which nodes may move
//! - [`comm_cost::comm_cost`]: internal/external cost of a hypothetical device
//! - [`balance::BalanceTracker`]: per-device load and the move gate
//! - [`partitioner::LocalSearchPartitioner`]: the single greedy sweep
//! - [`default_placement::default_placement`]: coarse fallback
//! - [`optimizer::PlacementOptimizer`]: estimator query and dispatch

pub mod assignment;
pub mod balance;
pub mod comm_cost;
pub mod cost_index;
pub mod default_placement;
pub mod eligibility;
pub mod knobs;
pub mod metadata;
pub mod optimizer;
pub mod partitioner;
pub mod report;
pub mod stats;

pub use balance::{BalanceTracker, Move};
pub use comm_cost::{comm_cost, NodeCommCost};
pub use cost_index::{CostIndex, NodeId};
pub use default_placement::{default_placement, DefaultPlacementOutcome};
pub use eligibility::{EligibilityFilter, Ineligible};
pub use knobs::{PinnedPolicy, PlacementKnobs, PlacementStrategy};
pub use metadata::{OpMetadata, OpMetadataProvider, OpRegistry};
pub use optimizer::{GraphOptimizer, PlacementOptimizer, PlacementResult};
pub use partitioner::{LocalSearchPartitioner, PartitionOutcome};
pub use report::{DeviceLoad, MoveRecord, PlacementOutcome, PlacementReport};
pub use stats::{CostStats, GraphStats};
