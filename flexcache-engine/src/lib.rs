//! # FlexCache Engine
//!
//! In-process key/value cache with pluggable eviction (LRU, FIFO, random),
//! TTL expiration, and dual capacity accounting by item count and byte
//! weight.
//!
//! ## Usage
//!
//! - Use `FlexCache::new()` for an unbounded LRU cache.
//! - Use `FlexCache::with_config` to bind a policy, capacity thresholds,
//!   and a periodic expiration-scan cadence.
//! - Implement `CacheValue` on stored types to report a byte weight and to
//!   receive a disposal callback when the cache releases the value.
//!
//! ## Design Principles
//!
//! 1. **Single Critical Section**: One lock guards the entry table, the
//!    policy ordering, the TTL view, and the counters, so every operation
//!    observes them consistent.
//! 2. **Arena + Indices**: Entries live in a dense slot arena; the policies
//!    order stable slot indices instead of pointers, keeping eviction O(1)
//!    without unsafe code.
//! 3. **Insert-Only Weights**: A value is weighed once at insertion; the
//!    recorded weight drives byte accounting for the entry's whole life.
//! 4. **Lazy Expiration**: Expired entries are semantically absent but are
//!    physically removed on access, on explicit `scan`, or when the
//!    periodic cadence fires.

mod cache;
mod config;
mod policy;
mod store;
mod ttl;

pub use cache::FlexCache;
pub use config::{CacheConfig, EvictionPolicy};

// Re-export the shared boundary types so most callers need one import.
pub use flexcache_common::{CacheValue, FlexError, FlexResult, Key, Ttl};
