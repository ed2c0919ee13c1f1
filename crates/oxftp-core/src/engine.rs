//! The stat engine: `listdir`/`lstat`/`stat` over raw directory listings.
//!
//! FTP exposes no stat call, so all metadata comes from listing the
//! *parent* directory of a path and parsing the line whose name token
//! matches. The engine orchestrates that reconstruction:
//!
//! - it fetches raw listing lines through the [`FtpSession`] collaborator,
//! - feeds them to the active [`ListingFormat`] parser, switching to the
//!   other format once if the first parse fails (the format is a
//!   per-server constant that cannot be known in advance),
//! - writes every entry seen in a listing into the private stat cache, so
//!   sibling lookups cost no further round trips,
//! - follows symlink chains for [`stat`](StatEngine::stat) with cycle
//!   detection,
//! - and owns the connection's clock offset, measured by
//!   [`synchronize_times`](StatEngine::synchronize_times).
//!
//! One engine owns one session; simultaneous transfers need one
//! engine/session pair each.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

use crate::cache::{CacheMiss, InvalidCapacity, StatCache};
use crate::clock;
use crate::parse::{ListingFormat, ParseError};
use crate::path;
use crate::session::{FtpSession, SessionError};
use crate::stat::StatResult;
use crate::timeshift::{TimeShift, TimeShiftError};

/// Errors from stat-engine operations.
#[derive(Error, Debug)]
pub enum StatError {
    /// The path did not appear in its parent's listing.
    #[error("no such file or directory: {path}")]
    NoSuchFileOrDirectory { path: String },

    /// The path exists but does not denote a directory.
    #[error("no such directory: {path}")]
    NoSuchDirectory { path: String },

    /// The root has no parent to list, so its own metadata is
    /// unobtainable.
    #[error("cannot stat the root directory: {path}")]
    RootDir { path: String },

    /// A symlink chain returned to an already-visited path.
    #[error("recursive link structure detected at {path}")]
    RecursiveLinkStructure { path: String },

    /// A listing line could not be interpreted, even after trying the
    /// other format.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Clock-offset measurement or validation failed.
    #[error(transparent)]
    TimeShift(#[from] TimeShiftError),

    /// The session reported a protocol-level failure.
    #[error("session failure during {operation} for {path:?}: {source}")]
    Session {
        operation: &'static str,
        path: String,
        #[source]
        source: SessionError,
    },
}

/// Reconstructs file metadata over a wire-level FTP session.
pub struct StatEngine<S: FtpSession> {
    session: S,
    cache: StatCache,
    format: ListingFormat,
    switching_allowed: bool,
    time_shift: TimeShift,
}

impl<S: FtpSession> StatEngine<S> {
    /// Create an engine over `session` with the default cache capacity.
    pub fn new(session: S) -> Self {
        Self {
            session,
            cache: StatCache::new(),
            format: ListingFormat::Unix,
            switching_allowed: true,
            time_shift: TimeShift::new(),
        }
    }

    /// Create an engine with a custom stat-cache capacity.
    pub fn with_cache_capacity(session: S, capacity: usize) -> Result<Self, InvalidCapacity> {
        Ok(Self {
            session,
            cache: StatCache::with_capacity(capacity)?,
            format: ListingFormat::Unix,
            switching_allowed: true,
            time_shift: TimeShift::new(),
        })
    }

    // ── Stat operations ─────────────────────────────────────────────

    /// List the names in a directory, excluding the synthetic `.`/`..`.
    ///
    /// # Errors
    ///
    /// [`StatError::NoSuchDirectory`] if the path resolves to something
    /// other than a directory; otherwise whatever the underlying stat or
    /// listing fails with.
    #[instrument(level = "debug", skip(self))]
    pub fn listdir(&mut self, dir: &str) -> Result<Vec<String>, StatError> {
        let abs = self.absolutize(dir)?;
        // The root is a directory by definition and has no parent to
        // probe it through.
        if abs != "/" {
            let stat = self.stat(&abs)?;
            if !stat.is_dir() {
                return Err(StatError::NoSuchDirectory { path: abs });
            }
        }
        let entries = self.listing_for(&abs)?;
        Ok(entries
            .into_iter()
            .map(|entry| entry.matched_name)
            .filter(|name| name != "." && name != "..")
            .collect())
    }

    /// Stat a path without following a final symlink.
    #[instrument(level = "debug", skip(self))]
    pub fn lstat(&mut self, path: &str) -> Result<StatResult, StatError> {
        let abs = self.absolutize(path)?;
        self.lstat_absolute(&abs)?
            .ok_or(StatError::NoSuchFileOrDirectory { path: abs })
    }

    /// Like [`lstat`](Self::lstat), but a missing entry is `Ok(None)`
    /// instead of an error. All other failures still propagate.
    pub fn try_lstat(&mut self, path: &str) -> Result<Option<StatResult>, StatError> {
        let abs = self.absolutize(path)?;
        self.lstat_absolute(&abs)
    }

    /// Stat a path, following symlink chains to the first non-link entry.
    ///
    /// # Errors
    ///
    /// [`StatError::RecursiveLinkStructure`] when the chain revisits a
    /// path it already passed through.
    #[instrument(level = "debug", skip(self))]
    pub fn stat(&mut self, path: &str) -> Result<StatResult, StatError> {
        let abs = self.absolutize(path)?;
        self.stat_absolute(&abs)?
            .ok_or(StatError::NoSuchFileOrDirectory { path: abs })
    }

    /// Like [`stat`](Self::stat), but a missing entry is `Ok(None)`.
    pub fn try_stat(&mut self, path: &str) -> Result<Option<StatResult>, StatError> {
        let abs = self.absolutize(path)?;
        self.stat_absolute(&abs)
    }

    fn lstat_absolute(&mut self, abs: &str) -> Result<Option<StatResult>, StatError> {
        match self.cache.get(abs) {
            Ok(hit) => {
                trace!(path = %abs, "stat cache hit");
                return Ok(Some(hit));
            }
            Err(miss) => trace!(path = %abs, ?miss, "stat cache miss"),
        }
        if abs == "/" {
            return Err(StatError::RootDir {
                path: abs.to_string(),
            });
        }
        let (parent, basename) = path::split(abs);
        let entries = self.listing_for(&parent)?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.matched_name == basename))
    }

    fn stat_absolute(&mut self, abs: &str) -> Result<Option<StatResult>, StatError> {
        let mut current = abs.to_string();
        let mut visited = HashSet::new();
        visited.insert(current.clone());
        loop {
            let Some(entry) = self.lstat_absolute(&current)? else {
                return Ok(None);
            };
            if !entry.is_symlink() {
                return Ok(Some(entry));
            }
            let Some(target) = entry.link_target.clone() else {
                return Ok(Some(entry));
            };
            let parent = path::dirname(&current);
            current = path::normalize(&path::join(&parent, &target));
            trace!(path = %current, "following symlink");
            if !visited.insert(current.clone()) {
                return Err(StatError::RecursiveLinkStructure { path: current });
            }
        }
    }

    // ── Listing retrieval & format switching ────────────────────────

    /// Fetch and parse the listing of an absolute directory path, caching
    /// every entry under `join(dir, matched_name)`.
    ///
    /// A parse failure with switching still allowed flips the format
    /// permanently and re-parses once; a second failure propagates. A
    /// successful parse with at least one entry locks the format for the
    /// engine's lifetime. An empty directory proves nothing about the
    /// format and locks nothing.
    fn listing_for(&mut self, dir: &str) -> Result<Vec<StatResult>, StatError> {
        let lines = self.fetch_lines(dir)?;
        let shift = self.time_shift.get();
        let entries = match Self::parse_lines(self.format, &lines, shift) {
            Ok(entries) => entries,
            Err(error) if self.switching_allowed => {
                let fallback = self.format.other();
                debug!(
                    from = %self.format,
                    to = %fallback,
                    %error,
                    "listing parse failed, switching format"
                );
                self.format = fallback;
                Self::parse_lines(self.format, &lines, shift)?
            }
            Err(error) => return Err(error.into()),
        };
        if !entries.is_empty() && self.switching_allowed {
            debug!(format = %self.format, "listing format confirmed");
            self.switching_allowed = false;
        }
        for entry in &entries {
            if entry.matched_name == "." || entry.matched_name == ".." {
                continue;
            }
            self.cache
                .set(&path::join(dir, &entry.matched_name), entry.clone());
        }
        Ok(entries)
    }

    fn parse_lines(
        format: ListingFormat,
        lines: &[String],
        time_shift: f64,
    ) -> Result<Vec<StatResult>, ParseError> {
        lines
            .iter()
            .filter(|line| !format.ignores(line))
            .map(|line| format.parse_line(line, time_shift))
            .collect()
    }

    fn fetch_lines(&mut self, dir: &str) -> Result<Vec<String>, StatError> {
        trace!(path = %dir, "requesting raw listing");
        let mut lines = Vec::new();
        self.session
            .raw_listing(dir, &mut |line| lines.push(line.to_string()))
            .map_err(|source| StatError::Session {
                operation: "listing",
                path: dir.to_string(),
                source,
            })?;
        Ok(lines)
    }

    /// The listing format currently in use.
    pub fn listing_format(&self) -> ListingFormat {
        self.format
    }

    /// Pin the listing format and switch off automatic probing.
    pub fn set_listing_format(&mut self, format: ListingFormat) {
        self.format = format;
        self.switching_allowed = false;
    }

    // ── Clock offset ────────────────────────────────────────────────

    /// The stored server-minus-client clock offset in seconds.
    pub fn time_shift(&self) -> f64 {
        self.time_shift.get()
    }

    /// Store a clock offset unconditionally (e.g. a previously measured
    /// value).
    pub fn set_time_shift(&mut self, seconds: f64) {
        self.time_shift.set(seconds);
    }

    /// Measure and store the server's clock offset.
    ///
    /// Writes a uniquely-named helper file into the current remote
    /// directory, reads its modification time back through the stat path,
    /// and compares it with the local clock. The helper file is deleted on
    /// every exit path; a deletion failure after an otherwise successful
    /// measurement is logged and ignored.
    ///
    /// # Errors
    ///
    /// [`TimeShiftError`] when the current directory is the root or the
    /// measured offset cannot be a timezone difference; the caller should
    /// pick a writable non-root directory and retry.
    #[instrument(level = "info", skip(self))]
    pub fn synchronize_times(&mut self) -> Result<f64, StatError> {
        let temp_name = self
            .session
            .make_temp_file()
            .map_err(|source| StatError::Session {
                operation: "make_temp_file",
                path: String::new(),
                source,
            })?;
        let temp_path = self.absolutize(&temp_name)?;
        let measured = self.measure_raw_shift(&temp_path);
        if let Err(error) = self.session.delete(&temp_path) {
            warn!(path = %temp_path, %error, "could not delete clock-sync helper file");
        }
        self.cache.invalidate(&temp_path);

        let raw_shift = measured?;
        TimeShift::validate(raw_shift)?;
        let shift = TimeShift::rounded_to_hour(raw_shift);
        self.time_shift.set(shift);
        info!(shift, "synchronized server clock offset");
        Ok(shift)
    }

    fn measure_raw_shift(&mut self, temp_path: &str) -> Result<f64, StatError> {
        if temp_path == "/" {
            return Err(TimeShiftError::RootDirectory.into());
        }
        let stat = self.stat(temp_path)?;
        let remote_mtime =
            stat.modify_time
                .ok_or_else(|| TimeShiftError::MissingModificationTime {
                    path: temp_path.to_string(),
                })?;
        Ok(remote_mtime - clock::epoch_now())
    }

    // ── Cache administration ────────────────────────────────────────

    /// Drop the cache entry for a path, forcing the next stat to fetch a
    /// fresh listing. Absence is not an error.
    pub fn invalidate(&mut self, path: &str) -> Result<(), StatError> {
        let abs = self.absolutize(path)?;
        self.cache.invalidate(&abs);
        Ok(())
    }

    /// Drop all cached entries, keeping the configured capacity.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Change the cache capacity, evicting oldest entries immediately if
    /// shrinking.
    pub fn resize_cache(&mut self, capacity: usize) -> Result<(), InvalidCapacity> {
        self.cache.resize(capacity)
    }

    /// Expire cached entries older than `max_age` seconds; `None` means
    /// entries never expire (the default).
    pub fn set_cache_max_age(&mut self, max_age: Option<f64>) {
        self.cache.set_max_age(max_age);
    }

    pub fn enable_cache(&mut self) {
        self.cache.set_enabled(true);
    }

    pub fn disable_cache(&mut self) {
        self.cache.set_enabled(false);
    }

    // ── Session passthroughs ────────────────────────────────────────
    //
    // Mutating operations go through the engine so the affected cache
    // entries can never serve stale metadata afterwards.

    /// Change the server-side current directory.
    pub fn change_dir(&mut self, path: &str) -> Result<(), StatError> {
        let abs = self.absolutize(path)?;
        self.session
            .change_dir(&abs)
            .map_err(|source| StatError::Session {
                operation: "change_dir",
                path: abs,
                source,
            })
    }

    /// The server-side current directory.
    pub fn current_dir(&mut self) -> Result<String, StatError> {
        self.session
            .current_dir()
            .map_err(|source| StatError::Session {
                operation: "current_dir",
                path: String::new(),
                source,
            })
    }

    /// Create a remote directory.
    #[instrument(level = "debug", skip(self))]
    pub fn make_dir(&mut self, path: &str) -> Result<(), StatError> {
        let abs = self.absolutize(path)?;
        self.session
            .make_dir(&abs)
            .map_err(|source| StatError::Session {
                operation: "make_dir",
                path: abs.clone(),
                source,
            })?;
        self.cache.invalidate(&abs);
        Ok(())
    }

    /// Remove an empty remote directory.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_dir(&mut self, path: &str) -> Result<(), StatError> {
        let abs = self.absolutize(path)?;
        self.session
            .remove_dir(&abs)
            .map_err(|source| StatError::Session {
                operation: "remove_dir",
                path: abs.clone(),
                source,
            })?;
        self.cache.invalidate(&abs);
        Ok(())
    }

    /// Delete a remote file.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, path: &str) -> Result<(), StatError> {
        let abs = self.absolutize(path)?;
        self.session
            .delete(&abs)
            .map_err(|source| StatError::Session {
                operation: "delete",
                path: abs.clone(),
                source,
            })?;
        self.cache.invalidate(&abs);
        Ok(())
    }

    /// Rename a remote file or directory.
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), StatError> {
        let abs_from = self.absolutize(from)?;
        let abs_to = self.absolutize(to)?;
        self.session
            .rename(&abs_from, &abs_to)
            .map_err(|source| StatError::Session {
                operation: "rename",
                path: abs_from.clone(),
                source,
            })?;
        self.cache.invalidate(&abs_from);
        self.cache.invalidate(&abs_to);
        Ok(())
    }

    /// Mutable access to the underlying session, e.g. for transfers.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Consume the engine, returning the session.
    pub fn into_session(self) -> S {
        self.session
    }

    // ── Helpers ─────────────────────────────────────────────────────

    /// Resolve a path to normalized absolute form, consulting the
    /// session's current directory for relative input.
    fn absolutize(&mut self, input: &str) -> Result<String, StatError> {
        if path::is_absolute(input) {
            Ok(path::normalize(input))
        } else {
            let cwd = self
                .session
                .current_dir()
                .map_err(|source| StatError::Session {
                    operation: "current_dir",
                    path: input.to_string(),
                    source,
                })?;
            Ok(path::normalize(&path::join(&cwd, input)))
        }
    }
}
