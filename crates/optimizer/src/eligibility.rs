//! Decides which nodes the placement pass may relocate.

use crate::knobs::{PinnedPolicy, PlacementKnobs};
use crate::metadata::OpMetadataProvider;
use placeforge_ir::{OpNode, PinnedDevices};
use serde::Serialize;

/// Why a node was kept where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ineligible {
    UnknownOp,
    Stateful,
    NotRelocatable,
    Unassigned,
    PinnedDevice,
}

pub struct EligibilityFilter<'a> {
    metadata: &'a dyn OpMetadataProvider,
    knobs: &'a PlacementKnobs,
    pinned: &'a PinnedDevices,
    policy: PinnedPolicy,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(
        metadata: &'a dyn OpMetadataProvider,
        knobs: &'a PlacementKnobs,
        pinned: &'a PinnedDevices,
    ) -> Self {
        Self {
            metadata,
            knobs,
            pinned,
            policy: knobs.pinned_policy,
        }
    }

    /// Overrides the configured pinned policy.
    pub fn with_policy(mut self, policy: PinnedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn check(&self, node: &OpNode) -> Result<(), Ineligible> {
        let metadata = self.metadata.lookup(&node.op).ok_or(Ineligible::UnknownOp)?;
        if metadata.is_stateful {
            return Err(Ineligible::Stateful);
        }
        if !self.knobs.is_relocatable(&node.op) {
            return Err(Ineligible::NotRelocatable);
        }
        if !node.has_device() {
            return Err(Ineligible::Unassigned);
        }
        if self.policy == PinnedPolicy::Strict && self.pinned.is_pinned(&node.device) {
            return Err(Ineligible::PinnedDevice);
        }
        Ok(())
    }

    pub fn is_eligible(&self, node: &OpNode) -> bool {
        self.check(node).is_ok()
    }
}
