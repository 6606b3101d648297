//! # Eviction Policies
//!
//! Ordering structures behind the three eviction policies. All variants
//! answer the same contract over arena slot indices:
//!
//! - `on_insert(idx)`: record a new candidate;
//! - `on_access(idx)`: note a hit on a fresh entry;
//! - `on_remove(idx)`: forget a slot on any removal path;
//! - `pick_victim()`: the slot to evict next.
//!
//! LRU and FIFO share the index-linked list; FIFO simply never reorders on
//! access. Random keeps an indexable membership set. The policy identity is
//! bound once at construction and cannot be switched.

mod linked;
mod random;

use crate::config::EvictionPolicy;
use linked::LinkedOrder;
use random::RandomOrder;

/// Policy-specific ordering state, one variant live per cache.
pub(crate) enum Policy {
    Lru(LinkedOrder),
    Fifo(LinkedOrder),
    Random(RandomOrder),
}

impl Policy {
    pub(crate) fn new(kind: EvictionPolicy) -> Self {
        match kind {
            EvictionPolicy::Lru => Policy::Lru(LinkedOrder::new()),
            EvictionPolicy::Fifo => Policy::Fifo(LinkedOrder::new()),
            EvictionPolicy::Random => Policy::Random(RandomOrder::new()),
        }
    }

    /// Records a newly inserted slot at the most-recent end.
    pub(crate) fn on_insert(&mut self, idx: usize) {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.push_back(idx),
            Policy::Random(order) => order.insert(idx),
        }
    }

    /// Records a hit on a fresh entry. Only LRU reorders.
    pub(crate) fn on_access(&mut self, idx: usize) {
        match self {
            Policy::Lru(order) => order.move_to_back(idx),
            Policy::Fifo(_) | Policy::Random(_) => {}
        }
    }

    /// Forgets a slot that left the cache (delete, eviction, expiration, clear).
    pub(crate) fn on_remove(&mut self, idx: usize) {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.remove(idx),
            Policy::Random(order) => order.remove(idx),
        }
    }

    /// The slot to evict next; `None` when the ordering is empty.
    ///
    /// The victim stays in the ordering until `on_remove` runs.
    pub(crate) fn pick_victim(&mut self) -> Option<usize> {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.front(),
            Policy::Random(order) => order.pick(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.len(),
            Policy::Random(order) => order.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.is_empty(),
            Policy::Random(order) => order.is_empty(),
        }
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Policy::Lru(order) | Policy::Fifo(order) => order.clear(),
            Policy::Random(order) => order.clear(),
        }
    }
}
