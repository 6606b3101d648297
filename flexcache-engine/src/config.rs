//! # Cache Configuration
//!
//! Construction-time options for the cache: eviction policy identity,
//! periodic scan cadence, and the two capacity thresholds.
//!
//! ## Design Principles
//! 1. **Typed Options**: Thresholds are `usize` and the cadence is a
//!    `Duration`, so negative or out-of-range inputs are unrepresentable and
//!    rejected where the host converts raw values into these types.
//! 2. **Zero Disables**: A threshold of 0 disables that cap; a zero scan
//!    interval disables periodic sweeping (lazy expiration still applies).
//! 3. **Immutable After Construction**: The policy and thresholds are bound
//!    once; there is no reconfiguration surface.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use flexcache_common::{FlexError, FlexResult};

/// Eviction policy identity, bound once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the least-recently-used entry.
    #[default]
    Lru,
    /// Evict in insertion order; accesses do not reorder.
    Fifo,
    /// Evict a uniformly random entry.
    Random,
}

impl EvictionPolicy {
    /// Returns the lowercase name used at the configuration boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Random => "random",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = FlexError;

    /// Parses `"lru"`, `"fifo"`, or `"random"`.
    ///
    /// # Errors
    /// Returns `FlexError::BadArgument` for any other input.
    fn from_str(name: &str) -> FlexResult<Self> {
        match name {
            "lru" => Ok(EvictionPolicy::Lru),
            "fifo" => Ok(EvictionPolicy::Fifo),
            "random" => Ok(EvictionPolicy::Random),
            other => Err(FlexError::BadArgument(format!(
                "unknown eviction policy {other:?}"
            ))),
        }
    }
}

/// Cache construction options.
///
/// The default configuration is an unbounded LRU cache with periodic
/// scanning disabled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Which entry to evict when a capacity threshold is exceeded.
    pub eviction_policy: EvictionPolicy,
    /// How often `set`/`get` trigger a full expiration sweep. Zero disables
    /// periodic sweeping; expired entries are still removed lazily on `get`.
    pub scan_interval: Duration,
    /// Maximum number of entries. 0 disables the item cap.
    pub max_items: usize,
    /// Maximum total byte weight. 0 disables the byte cap.
    pub max_bytes: usize,
}
