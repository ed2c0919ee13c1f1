//! TTL-aware stat-result cache keyed by absolute remote paths.
//!
//! Directory listings cost one protocol round trip each, so the engine
//! caches every entry it sees in a listing, not only the one a caller
//! asked for; sibling lookups then come for free. This wrapper adds the
//! policy knobs on top of [`TimedLru`]: an optional maximum entry age and
//! an enable switch.

use crate::cache::lru::{InvalidCapacity, TimedLru};
use crate::clock;
use crate::path;
use crate::stat::StatResult;

/// Default number of cached entries.
pub(crate) const DEFAULT_CAPACITY: usize = 1000;

/// Why a lookup produced nothing. Internal control flow only; callers of
/// the engine never see this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheMiss {
    /// Caching is switched off.
    Disabled,
    /// No entry under this path.
    Absent,
    /// The entry exceeded `max_age` and was evicted.
    Expired,
}

/// Cache of stat results, keyed by absolute remote path.
pub(crate) struct StatCache {
    entries: TimedLru<String, StatResult>,
    max_age: Option<f64>,
    enabled: bool,
}

impl StatCache {
    pub(crate) fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY).expect("default capacity is non-zero")
    }

    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, InvalidCapacity> {
        Ok(Self {
            entries: TimedLru::new(capacity)?,
            max_age: None,
            enabled: true,
        })
    }

    pub(crate) fn get(&mut self, path: &str) -> Result<StatResult, CacheMiss> {
        self.get_at(path, clock::epoch_now())
    }

    pub(crate) fn get_at(&mut self, path: &str, now: f64) -> Result<StatResult, CacheMiss> {
        if !self.enabled {
            return Err(CacheMiss::Disabled);
        }
        if let (Some(max_age), Some(written_at)) = (self.max_age, self.entries.last_modified(path))
        {
            if now - written_at > max_age {
                self.entries.remove(path);
                return Err(CacheMiss::Expired);
            }
        }
        self.entries.get(path).cloned().ok_or(CacheMiss::Absent)
    }

    /// Store a stat result. No-op while disabled.
    ///
    /// `path` must be absolute; a relative key is a bug in the caller, not
    /// a recoverable condition.
    pub(crate) fn set(&mut self, path: &str, value: StatResult) {
        if !self.enabled {
            return;
        }
        assert!(
            path::is_absolute(path),
            "stat cache keys must be absolute paths, got {path:?}"
        );
        self.entries.set(path.to_string(), value);
    }

    /// Drop the entry under `path` if present; absence is not an error.
    pub(crate) fn invalidate(&mut self, path: &str) {
        self.entries.remove(path);
    }

    /// Drop everything, keeping the configured capacity.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn resize(&mut self, capacity: usize) -> Result<(), InvalidCapacity> {
        self.entries.resize(capacity)
    }

    pub(crate) fn set_max_age(&mut self, max_age: Option<f64>) {
        self.max_age = max_age;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
