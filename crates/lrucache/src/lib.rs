//! # lrucache
//!
//! Fixed-capacity LRU cache with O(1) `get` and `put`.
//!
//! ## Architecture
//! - **Key index**: AHash `HashMap` from key to slot handle
//! - **Recency list**: doubly-linked list over a slot arena with head/tail
//!   sentinels, most recently used first
//! - **Eviction**: a new key on a full cache drops the entry before the tail
//!   sentinel, then links the new entry after the head sentinel
//! - **SharedLruCache**: the same cache behind one `parking_lot` mutex

#![warn(missing_docs)]

mod cache;
mod error;
mod list;
mod lru;
mod stats;

pub use cache::SharedLruCache;
pub use error::{Error, InvariantError, Result};
pub use list::Iter;
pub use lru::LruCache;
pub use stats::{CacheStats, StatsSnapshot};
