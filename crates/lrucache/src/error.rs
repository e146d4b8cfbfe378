//! Error types for lrucache

use thiserror::Error;

/// Result type alias for lrucache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a cache
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Capacity must be at least one entry
    #[error("invalid capacity: {capacity} (must be greater than 0)")]
    InvalidCapacity {
        /// The rejected capacity
        capacity: usize,
    },
}

/// A structural invariant of the cache does not hold.
///
/// Only produced by [`LruCache::check_invariants`](crate::LruCache::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantError(String);

impl InvariantError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Description of the violated invariant
    pub fn message(&self) -> &str {
        &self.0
    }
}
