//! # Cache Engine
//!
//! The public cache object: entry table, bound eviction policy, TTL
//! tracking, capacity accounting, and the operation dispatcher that keeps
//! them consistent.
//!
//! ## Design Principles
//!
//! 1. **One Coarse Lock**: Every operation runs under a single
//!    `parking_lot::Mutex` guarding the table, the policy ordering, the
//!    deadline queue, and the counters as one unit. The core is small enough
//!    that finer-grained locking would only expose invariant violations.
//! 2. **Hooks Outside The Lock**: Removal paths collect the released values
//!    and run their close hooks after the guard drops. Hook panics are
//!    caught and logged; the entry is removed regardless.
//! 3. **Transactional Sets**: `set` validates the key, checks for
//!    duplicates, and weighs the value before any state changes, so every
//!    failure leaves the cache exactly as it was.
//! 4. **Lazy Plus Periodic Expiration**: Expired entries are removed when a
//!    `get` touches them, and in bulk when the scan interval elapses or
//!    `scan` is called explicitly. Until then they still count toward the
//!    item and byte totals.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use flexcache_common::{CacheValue, FlexError, FlexResult, Key, Ttl};

use crate::config::{CacheConfig, EvictionPolicy};
use crate::policy::Policy;
use crate::store::{Entry, EntryStore};
use crate::ttl::{resolve_deadline, DeadlineQueue};

/// In-process key/value cache with pluggable eviction, TTL expiration, and
/// dual capacity accounting (item count and byte weight).
///
/// Values are opaque: the cache consults them only through the
/// [`CacheValue`] capabilities. Lookups hand out `Arc` clones; the close
/// hook still runs exactly once when the cache itself releases the value.
pub struct FlexCache<V: CacheValue> {
    config: CacheConfig,
    inner: Mutex<CacheInner<V>>,
}

/// Everything the single critical section guards.
struct CacheInner<V: CacheValue> {
    store: EntryStore<V>,
    policy: Policy,
    deadlines: DeadlineQueue,
    byte_total: usize,
    last_scan: Instant,
}

impl<V: CacheValue> FlexCache<V> {
    /// Creates an unbounded LRU cache with periodic scanning disabled.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache from explicit construction options.
    pub fn with_config(config: CacheConfig) -> Self {
        debug!(
            policy = %config.eviction_policy,
            max_items = config.max_items,
            max_bytes = config.max_bytes,
            scan_interval_ms = config.scan_interval.as_millis() as u64,
            "cache created"
        );

        let inner = CacheInner {
            store: EntryStore::new(),
            policy: Policy::new(config.eviction_policy),
            deadlines: DeadlineQueue::new(),
            byte_total: 0,
            last_scan: Instant::now(),
        };

        FlexCache {
            config,
            inner: Mutex::new(inner),
        }
    }

    /// The construction options this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The eviction policy bound at construction.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.config.eviction_policy
    }

    /// Inserts a value under a new key.
    ///
    /// The value is weighed once via its size capability; the recorded
    /// weight never changes. Inserting may evict other entries to satisfy
    /// the capacity thresholds. A due periodic sweep runs after the
    /// insertion.
    ///
    /// # Errors
    /// - `FlexError::EmptyKey` if `key` has no bytes;
    /// - `FlexError::DuplicateKey` if the key is already present (delete
    ///   first to replace);
    /// - any error from the value's size capability.
    ///
    /// On failure no state changes and no hooks fire.
    pub fn set<K: AsRef<[u8]>>(&self, key: K, value: V, ttl: Ttl) -> FlexResult<()> {
        let key = Key::new(key)?;
        let mut released = Vec::new();
        let result = self.inner.lock().set(&self.config, key, value, ttl, &mut released);
        Self::run_close_hooks(released);
        result
    }

    /// Returns the value stored under `key`, or `None`.
    ///
    /// A hit on an expired entry removes it (running its close hook) and
    /// reports `None`. A due periodic sweep runs before the lookup.
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Arc<V>> {
        let mut released = Vec::new();
        let hit = {
            let mut inner = self.inner.lock();
            let now = Instant::now();
            inner.scan_if_due(&self.config, now, &mut released);
            inner.get(key.as_ref(), now, &mut released)
        };
        Self::run_close_hooks(released);
        hit
    }

    /// Removes the entry under `key` if physically present.
    ///
    /// Returns whether a removal occurred. The close hook fires on removal.
    pub fn delete<K: AsRef<[u8]>>(&self, key: K) -> bool {
        let mut released = Vec::new();
        let removed = self.inner.lock().delete(key.as_ref(), &mut released);
        Self::run_close_hooks(released);
        removed
    }

    /// Sweeps the deadline queue and removes every expired entry.
    pub fn scan(&self) {
        let mut released = Vec::new();
        self.inner.lock().sweep(Instant::now(), &mut released);
        Self::run_close_hooks(released);
    }

    /// Removes every entry and resets the counters to zero.
    pub fn clear(&self) {
        let mut released = Vec::new();
        self.inner.lock().clear(&mut released);
        Self::run_close_hooks(released);
    }

    /// Number of physically present entries, including expired ones that
    /// have not been swept yet.
    pub fn item_count(&self) -> usize {
        self.inner.lock().store.len()
    }

    /// Sum of the recorded byte weights of all physically present entries.
    pub fn byte_total(&self) -> usize {
        self.inner.lock().byte_total
    }

    /// Runs close hooks after the guard has been released.
    ///
    /// A panicking hook is swallowed; the entry is already gone from the
    /// cache either way.
    fn run_close_hooks(released: Vec<Arc<V>>) {
        for value in released {
            if catch_unwind(AssertUnwindSafe(|| value.close())).is_err() {
                warn!("value close hook panicked; entry removed regardless");
            }
        }
    }
}

impl<V: CacheValue> Default for FlexCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CacheValue> Drop for FlexCache<V> {
    fn drop(&mut self) {
        // Remaining values still get their close hooks when the cache goes
        // away. The hooks run unguarded here; there is no cache left to
        // re-enter.
        let mut released = Vec::new();
        self.inner.get_mut().clear(&mut released);
        for value in released {
            if catch_unwind(AssertUnwindSafe(|| value.close())).is_err() {
                warn!("value close hook panicked during cache drop");
            }
        }
    }
}

impl<V: CacheValue> CacheInner<V> {
    fn set(
        &mut self,
        config: &CacheConfig,
        key: Key,
        value: V,
        ttl: Ttl,
        released: &mut Vec<Arc<V>>,
    ) -> FlexResult<()> {
        if self.store.index_of(key.as_bytes()).is_some() {
            return Err(FlexError::DuplicateKey);
        }

        let weight = value.item_size()?;
        let now = Instant::now();
        let deadline = resolve_deadline(ttl, now);

        self.reserve(config, weight, released);

        let idx = self.store.insert(Entry {
            key: key.clone(),
            value: Arc::new(value),
            weight,
            deadline,
        })?;
        self.byte_total += weight;
        if let Some(at) = deadline {
            self.deadlines.arm(key, at);
        }
        self.policy.on_insert(idx);

        self.scan_if_due(config, now, released);
        Ok(())
    }

    fn get(&mut self, key: &[u8], now: Instant, released: &mut Vec<Arc<V>>) -> Option<Arc<V>> {
        let idx = self.store.index_of(key)?;

        if self.store.entry(idx).is_expired(now) {
            if let Some(value) = self.remove_slot(idx) {
                trace!(key = %String::from_utf8_lossy(key), "expired entry removed on access");
                released.push(value);
            }
            return None;
        }

        self.policy.on_access(idx);
        Some(Arc::clone(&self.store.entry(idx).value))
    }

    fn delete(&mut self, key: &[u8], released: &mut Vec<Arc<V>>) -> bool {
        let Some((idx, entry)) = self.store.remove(key) else {
            return false;
        };
        self.policy.on_remove(idx);
        self.byte_total -= entry.weight;
        released.push(entry.value);
        true
    }

    fn clear(&mut self, released: &mut Vec<Arc<V>>) {
        for entry in self.store.drain() {
            released.push(entry.value);
        }
        self.policy.clear();
        self.deadlines.clear();
        self.byte_total = 0;
    }

    /// Evicts until the thresholds admit one more entry of weight `weight`.
    ///
    /// A value whose weight alone exceeds the byte budget is still admitted
    /// once the ordering is empty; the single oversize entry is accepted by
    /// design of the byte cap, not treated as an error.
    fn reserve(&mut self, config: &CacheConfig, weight: usize, released: &mut Vec<Arc<V>>) {
        if config.max_items > 0 {
            while self.store.len() + 1 > config.max_items {
                if !self.evict_one(released) {
                    break;
                }
            }
        }

        if config.max_bytes > 0 {
            while self.byte_total + weight > config.max_bytes && !self.policy.is_empty() {
                if !self.evict_one(released) {
                    break;
                }
            }
        }
    }

    /// Removes the policy's chosen victim. Returns false when the ordering
    /// is empty.
    fn evict_one(&mut self, released: &mut Vec<Arc<V>>) -> bool {
        let Some(victim) = self.policy.pick_victim() else {
            return false;
        };
        trace!(key = %self.store.entry(victim).key, "evicting entry");
        match self.remove_slot(victim) {
            Some(value) => {
                released.push(value);
                true
            }
            None => false,
        }
    }

    /// Removes every entry whose deadline has passed at `now`.
    fn sweep(&mut self, now: Instant, released: &mut Vec<Arc<V>>) {
        let mut removed = 0usize;
        while let Some(key) = self.deadlines.pop_expired(now) {
            // The pair may be stale: the entry can be gone, or the key can
            // have been re-inserted with a different deadline. Only a
            // genuinely expired live entry is removed.
            let Some(idx) = self.store.index_of(key.as_bytes()) else {
                continue;
            };
            if !self.store.entry(idx).is_expired(now) {
                continue;
            }
            if let Some(value) = self.remove_slot(idx) {
                released.push(value);
                removed += 1;
            }
        }
        if removed > 0 {
            trace!(removed, "expiration sweep removed entries");
        }
    }

    /// Runs a sweep when the periodic cadence says one is due.
    fn scan_if_due(&mut self, config: &CacheConfig, now: Instant, released: &mut Vec<Arc<V>>) {
        if config.scan_interval.is_zero() {
            return;
        }
        if now.duration_since(self.last_scan) >= config.scan_interval {
            self.sweep(now, released);
            self.last_scan = now;
        }
    }

    /// Removes the entry in `idx` from the table, the policy ordering, and
    /// the byte total, returning its value for the close hook.
    fn remove_slot(&mut self, idx: usize) -> Option<Arc<V>> {
        let entry = self.store.remove_at(idx)?;
        self.policy.on_remove(idx);
        self.byte_total -= entry.weight;
        Some(entry.value)
    }
}
