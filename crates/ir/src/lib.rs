//! placeforge graph representation and device inventory.

pub mod builder;
pub mod device;
pub mod graph;

pub use builder::*;
pub use device::*;
pub use graph::*;
