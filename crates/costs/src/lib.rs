//! Execution-cost estimation interfaces for placeforge.

pub mod analytical;
pub mod error;
pub mod estimate;
pub mod estimator;

pub use analytical::*;
pub use error::*;
pub use estimate::*;
pub use estimator::*;
