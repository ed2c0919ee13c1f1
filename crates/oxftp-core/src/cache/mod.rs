//! Metadata caching.
//!
//! [`TimedLru`] is the generic bounded-LRU primitive; `StatCache` layers
//! the stat-specific policy (absolute-path keys, optional TTL, enable
//! switch) on top and is owned privately by one engine instance.

pub mod lru;
pub(crate) mod stat_cache;

pub use lru::{InvalidCapacity, TimedLru};
pub(crate) use stat_cache::{CacheMiss, StatCache};
