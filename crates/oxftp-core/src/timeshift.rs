//! Client/server clock-offset ("time shift") handling.
//!
//! The shift is the signed number of seconds such that
//! `server local time ≈ client local time + shift`. It disambiguates the
//! year-less timestamps of Unix-style listings and feeds "copy only if
//! newer" decisions in hosts. A genuine timezone offset is a whole number
//! of hours, which is what [`TimeShift::validate`] enforces: anything far
//! from a whole hour, or beyond a day, means the measurement (not the
//! clock) is wrong.

use thiserror::Error;

const SECONDS_PER_HOUR: f64 = 3600.0;
/// Largest offset that can still be a timezone difference.
const MAX_PLAUSIBLE_SHIFT: f64 = 24.0 * SECONDS_PER_HOUR;
/// How far from a whole hour a measured shift may drift (clock skew).
const WHOLE_HOUR_TOLERANCE: f64 = 5.0 * 60.0;

/// Errors from clock-offset computation and validation.
#[derive(Error, Debug)]
pub enum TimeShiftError {
    /// The measured offset exceeds a day; no timezone explains that.
    #[error("time shift of {shift} s is implausibly large (beyond one day)")]
    ImplausibleShift { shift: f64 },

    /// The measured offset is more than five minutes away from a whole
    /// hour, so it cannot be a timezone difference.
    #[error("time shift of {shift} s is not close enough to a whole hour")]
    NotWholeHour { shift: f64 },

    /// Clock synchronization needs a writable non-root directory.
    #[error("cannot synchronize clocks via the root directory")]
    RootDirectory,

    /// The helper file's listing entry carried no modification time.
    #[error("listing carries no modification time for {path}")]
    MissingModificationTime { path: String },
}

/// The stored clock offset of one connection.
///
/// Defaults to zero at construction, persists for the connection's
/// lifetime, and is read by every listing parse and newer-than comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeShift {
    seconds: f64,
}

impl TimeShift {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current offset in seconds.
    #[inline]
    pub fn get(&self) -> f64 {
        self.seconds
    }

    /// Store an offset unconditionally (e.g. restoring a saved value).
    #[inline]
    pub fn set(&mut self, seconds: f64) {
        self.seconds = seconds;
    }

    /// Round an offset to the nearest whole hour, ties away from zero,
    /// preserving sign.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxftp_core::timeshift::TimeShift;
    ///
    /// assert_eq!(TimeShift::rounded_to_hour(1800.0), 3600.0);
    /// assert_eq!(TimeShift::rounded_to_hour(1500.0), 0.0);
    /// assert_eq!(TimeShift::rounded_to_hour(-1800.0), -3600.0);
    /// assert_eq!(TimeShift::rounded_to_hour(0.0), 0.0);
    /// ```
    pub fn rounded_to_hour(seconds: f64) -> f64 {
        let sign = if seconds < 0.0 { -1.0 } else { 1.0 };
        sign * ((seconds.abs() / SECONDS_PER_HOUR) + 0.5).floor() * SECONDS_PER_HOUR
    }

    /// Check that a measured offset can plausibly be a timezone
    /// difference.
    pub fn validate(seconds: f64) -> Result<(), TimeShiftError> {
        let rounded = Self::rounded_to_hour(seconds);
        if rounded.abs() > MAX_PLAUSIBLE_SHIFT {
            return Err(TimeShiftError::ImplausibleShift { shift: seconds });
        }
        if (seconds - rounded).abs() > WHOLE_HOUR_TOLERANCE {
            return Err(TimeShiftError::NotWholeHour { shift: seconds });
        }
        Ok(())
    }
}
