//! # Entry Table
//!
//! Primary associative index for the cache: a hash map from key to slot
//! index over a dense entry arena.
//!
//! ## Design Principles
//! 1. **Stable Slot Indices**: Entries live in `Vec<Option<Entry>>` slots
//!    whose indices stay fixed for the entry's lifetime; the eviction policy
//!    uses those indices as its ordering tokens.
//! 2. **Shared Key Buffers**: The map key and the entry's own key are clones
//!    of one `Arc<[u8]>`, so an entry costs one key allocation.
//! 3. **Slot Recycling**: A free list reuses vacated slots to keep the arena
//!    dense under churn.

use std::sync::Arc;
use std::time::Instant;

use ahash::RandomState;
use hashbrown::HashMap;

use flexcache_common::{FlexError, FlexResult, Key};

/// One stored entry: the owning key, the value handle, the byte weight
/// recorded at insertion, and the optional monotonic deadline.
pub(crate) struct Entry<V> {
    pub(crate) key: Key,
    pub(crate) value: Arc<V>,
    pub(crate) weight: usize,
    pub(crate) deadline: Option<Instant>,
}

impl<V> Entry<V> {
    /// Returns true when the entry's deadline has passed at `now`.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if deadline <= now)
    }
}

/// Key-to-slot index over a dense entry arena.
pub(crate) struct EntryStore<V> {
    /// Key -> slot index for O(1) lookup.
    map: HashMap<Key, usize, RandomState>,
    /// Dense entry storage; `None` marks a vacated slot.
    slots: Vec<Option<Entry<V>>>,
    /// Free-list for recycling vacated slots.
    free: Vec<usize>,
}

impl<V> EntryStore<V> {
    pub(crate) fn new() -> Self {
        EntryStore {
            map: HashMap::with_hasher(RandomState::new()),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Slot index for a key, if present.
    pub(crate) fn index_of(&self, key: &[u8]) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Borrow the entry in a live slot.
    ///
    /// Callers pass indices obtained from `index_of` or `insert`; a vacated
    /// index here is a bookkeeping bug.
    pub(crate) fn entry(&self, idx: usize) -> &Entry<V> {
        self.slots[idx].as_ref().expect("live slot")
    }

    /// Inserts a new entry and returns its slot index.
    ///
    /// # Errors
    /// Returns `FlexError::DuplicateKey` if the key is already present; the
    /// store is unchanged and `entry` is dropped.
    pub(crate) fn insert(&mut self, entry: Entry<V>) -> FlexResult<usize> {
        if self.map.contains_key(entry.key.as_bytes()) {
            return Err(FlexError::DuplicateKey);
        }

        let idx = self.free.pop().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        });

        self.map.insert(entry.key.clone(), idx);
        self.slots[idx] = Some(entry);
        Ok(idx)
    }

    /// Removes the entry at `idx`, returning it.
    ///
    /// Updates the map and the free list. Returns `None` if the slot is
    /// already vacant.
    pub(crate) fn remove_at(&mut self, idx: usize) -> Option<Entry<V>> {
        let entry = self.slots[idx].take()?;
        self.map.remove(entry.key.as_bytes());
        self.free.push(idx);
        Some(entry)
    }

    /// Removes an entry by key, returning its slot index and the entry.
    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<(usize, Entry<V>)> {
        let idx = self.index_of(key)?;
        let entry = self.remove_at(idx)?;
        Some((idx, entry))
    }

    /// Removes every entry, returning them in unspecified order.
    pub(crate) fn drain(&mut self) -> Vec<Entry<V>> {
        self.map.clear();
        self.free.clear();
        self.slots.drain(..).flatten().collect()
    }
}
