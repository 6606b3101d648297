// flexcache-common - Shared types and error taxonomy for FlexCache
//
// This crate defines the key, TTL, and value-capability contracts shared
// between the cache engine and its consumers.

pub mod error;
pub mod types;

// Re-export for convenience
pub use error::{FlexError, FlexResult};
pub use types::{CacheValue, Key, Ttl};
