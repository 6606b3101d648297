//! # Random Membership Ordering
//!
//! Indexable membership set for the random eviction policy: a dense vector
//! of member slots plus a slot-parallel back-index, so removal is O(1) via
//! swap-with-last and victims are drawn with uniform probability.
//!
//! The pseudo-random source is seeded per cache instance from OS entropy;
//! reproducibility is not a contract.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Membership set with uniform victim selection.
pub(crate) struct RandomOrder {
    /// Dense list of member slot indices.
    members: Vec<usize>,
    /// Slot index -> position in `members`.
    positions: Vec<Option<usize>>,
    rng: SmallRng,
}

impl RandomOrder {
    pub(crate) fn new() -> Self {
        RandomOrder {
            members: Vec::new(),
            positions: Vec::new(),
            rng: SmallRng::from_entropy(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds `idx` to the membership.
    pub(crate) fn insert(&mut self, idx: usize) {
        if idx >= self.positions.len() {
            self.positions.resize(idx + 1, None);
        }
        debug_assert!(self.positions[idx].is_none());

        self.members.push(idx);
        self.positions[idx] = Some(self.members.len() - 1);
    }

    /// Removes `idx` by swapping it with the last member. No-op if absent.
    pub(crate) fn remove(&mut self, idx: usize) {
        let Some(position) = self.positions.get_mut(idx).and_then(Option::take) else {
            return;
        };

        self.members.swap_remove(position);
        if let Some(&moved) = self.members.get(position) {
            self.positions[moved] = Some(position);
        }
    }

    /// Draws a member with uniform probability. `None` when empty.
    pub(crate) fn pick(&mut self) -> Option<usize> {
        if self.members.is_empty() {
            return None;
        }
        let position = self.rng.gen_range(0..self.members.len());
        Some(self.members[position])
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
        self.positions.clear();
    }
}
