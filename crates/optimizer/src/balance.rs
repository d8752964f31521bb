//! Per-device compute load and the balance constraint gating every move.

use crate::assignment::DeviceId;
use crate::comm_cost::NodeCommCost;

/// Absorbs float noise when a share lands exactly on the margin.
const SHARE_TOLERANCE: f64 = 1e-9;

/// A relocation under evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub compute_cost: i64,
    pub before: NodeCommCost,
    pub after: NodeCommCost,
    pub origin: DeviceId,
    pub destination: DeviceId,
}

#[derive(Debug, Clone)]
pub struct BalanceTracker {
    loads: Vec<i64>,
    total: i64,
    ideal_share: f64,
    compute_margin: f64,
}

impl BalanceTracker {
    /// `num_devices` sizes the load table; the ideal share is one over the
    /// inventory size, pinned devices included.
    pub fn new(num_devices: usize, inventory_size: usize, compute_margin: f64) -> Self {
        Self {
            loads: vec![0; num_devices],
            total: 0,
            ideal_share: 1.0 / inventory_size.max(1) as f64,
            compute_margin,
        }
    }

    pub fn add(&mut self, device: DeviceId, compute_cost: i64) {
        self.loads[device.0] += compute_cost;
        self.total += compute_cost;
    }

    pub fn load(&self, device: DeviceId) -> i64 {
        self.loads[device.0]
    }

    pub fn loads(&self) -> &[i64] {
        &self.loads
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn ideal_share(&self) -> f64 {
        self.ideal_share
    }

    pub fn compute_margin(&self) -> f64 {
        self.compute_margin
    }

    pub fn share(&self, device: DeviceId) -> f64 {
        self.share_of(self.load(device))
    }

    fn share_of(&self, load: i64) -> f64 {
        if self.total == 0 {
            return self.ideal_share;
        }
        load as f64 / self.total as f64
    }

    fn within_margin(&self, load: i64) -> bool {
        (self.share_of(load) - self.ideal_share).abs() <= self.compute_margin + SHARE_TOLERANCE
    }

    /// Accept iff the move strictly lowers the node's cut contribution and
    /// both the origin and destination stay within the margin afterwards.
    pub fn is_beneficial(&self, mv: &Move) -> bool {
        if mv.after.delta() >= mv.before.delta() {
            return false;
        }
        self.within_margin(self.load(mv.origin) - mv.compute_cost)
            && self.within_margin(self.load(mv.destination) + mv.compute_cost)
    }

    pub fn apply(&mut self, mv: &Move) {
        self.loads[mv.origin.0] -= mv.compute_cost;
        self.loads[mv.destination.0] += mv.compute_cost;
    }

    /// Conservation check: per-device loads add up to the total.
    pub fn is_conserved(&self) -> bool {
        self.loads.iter().sum::<i64>() == self.total
    }
}
