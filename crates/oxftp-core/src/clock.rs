//! Wall-clock access for the crate.
//!
//! Everything that needs "now" goes through [`epoch_now`] so that the
//! internal `*_at` variants of the cache and parser entry points can pin the
//! clock in tests.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as seconds since the Unix epoch.
pub(crate) fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}
