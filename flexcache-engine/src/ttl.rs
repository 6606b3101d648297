//! # TTL Tracking
//!
//! Deadline bookkeeping for entries with finite time-to-live: input
//! normalization to the monotonic clock, and a min-heap of (deadline, key)
//! pairs that makes bulk expiration sweeps cheap.
//!
//! ## Design Principles
//! 1. **Monotonic Deadlines**: Wall-clock TTL inputs are converted once, at
//!    the operation's entry, so later wall-clock adjustments cannot
//!    resurrect expired entries or kill live ones.
//! 2. **Lazy Disarm**: Removing an entry leaves its heap pair behind; the
//!    sweep skips pairs whose entry is gone or no longer expired. The stale
//!    pairs are bounded by the number of arms since the last sweep.
//! 3. **Untracked Infinity**: Entries without a finite deadline never enter
//!    the heap, so sweeps scale with the armed population only.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant, SystemTime};

use flexcache_common::{Key, Ttl};

/// Resolves a boundary TTL into a monotonic deadline, or `None` for "never".
///
/// Absolute wall-clock instants are converted with the wall/monotonic offset
/// captured here; instants already in the past map to a deadline strictly
/// before `now`, which forces expiration on the next observation.
pub(crate) fn resolve_deadline(ttl: Ttl, now: Instant) -> Option<Instant> {
    match ttl {
        Ttl::Never => None,
        Ttl::After(delay) if delay.is_zero() => None,
        Ttl::After(delay) => now.checked_add(delay),
        Ttl::At(when) => match when.duration_since(SystemTime::now()) {
            Ok(ahead) if ahead.is_zero() => Some(now),
            Ok(ahead) => now.checked_add(ahead),
            Err(_) => Some(now.checked_sub(Duration::from_nanos(1)).unwrap_or(now)),
        },
    }
}

/// A pending (deadline, key) pair. Heap order considers the deadline only.
struct Deadline {
    at: Instant,
    key: Key,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at)
    }
}

/// Min-heap of armed deadlines, soonest first.
pub(crate) struct DeadlineQueue {
    heap: BinaryHeap<Reverse<Deadline>>,
}

impl DeadlineQueue {
    pub(crate) fn new() -> Self {
        DeadlineQueue {
            heap: BinaryHeap::new(),
        }
    }

    /// Tracks `key` as expiring at `at`.
    pub(crate) fn arm(&mut self, key: Key, at: Instant) {
        self.heap.push(Reverse(Deadline { at, key }));
    }

    /// Pops the next key whose armed deadline is at or before `now`.
    ///
    /// Yields candidates, not certainties: the caller must re-check the live
    /// entry before removing it, because a popped key may have been deleted
    /// and re-inserted with a different deadline since it was armed.
    pub(crate) fn pop_expired(&mut self, now: Instant) -> Option<Key> {
        let Reverse(next) = self.heap.peek()?;
        if next.at > now {
            return None;
        }
        self.heap.pop().map(|Reverse(deadline)| deadline.key)
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.heap.len()
    }
}
