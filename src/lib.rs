//! placeforge: cost-aware device placement for computation graphs.
//!
//! Re-exports the workspace crates under one roof.

pub use placeforge_costs as costs;
pub use placeforge_ir as ir;
pub use placeforge_optimizer as optimizer;

pub use placeforge_optimizer::{GraphOptimizer, PlacementKnobs, PlacementOptimizer};
