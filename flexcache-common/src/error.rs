//! # Error Taxonomy
//!
//! Purpose: Define the error kinds surfaced at the cache boundary and the
//! shared result alias used across the workspace.
//!
//! ## Design Principles
//! 1. **Small Surface**: Only the failures a caller can act on get a variant.
//! 2. **No Error For Misses**: Lookups return `Option` and deletes return
//!    `bool`; absence is a normal outcome, not a failure.
//! 3. **Transactional Sets**: Every variant raised by `set` is reported
//!    before any cache state changes, so a failed call leaves the cache
//!    exactly as it was.

use thiserror::Error;

/// Result type used throughout the FlexCache workspace.
pub type FlexResult<T> = Result<T, FlexError>;

/// Errors surfaced by cache construction and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlexError {
    /// A constructor or parser received an unrecognized option.
    #[error("invalid argument: {0}")]
    BadArgument(String),

    /// Keys must contain at least one byte.
    #[error("key cannot be empty")]
    EmptyKey,

    /// `set` refuses to overwrite; callers delete first to replace.
    #[error("key already exists")]
    DuplicateKey,

    /// The value's size capability failed while weighing an insertion.
    #[error("value size callback failed: {0}")]
    ValueSize(String),
}
