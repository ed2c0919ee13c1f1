//! Directory-listing parsers.
//!
//! FTP servers answer `LIST` with vendor-specific, line-oriented text. Two
//! formats cover practically every server: the Unix `ls -l` style and the
//! Microsoft/DOS style. Which one a server speaks is a per-server constant
//! that cannot be known in advance, so the engine probes with one format
//! and falls back to the other on a parse failure (see
//! [`StatEngine`](crate::engine::StatEngine)).
//!
//! Each parser turns one raw line into a [`StatResult`]. Lines that carry
//! no entry data (blank lines, the `total N` summary) are reported by
//! [`ListingFormat::ignores`] and must be skipped by the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock;
use crate::stat::StatResult;

pub mod msdos;
pub mod unix;

mod time;

/// Errors produced while interpreting a single listing line.
///
/// A parse error is recoverable exactly once per engine: it triggers the
/// automatic switch to the other listing format. A second failure
/// propagates to the caller.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The line has fewer whitespace-delimited fields than the format needs.
    #[error("listing line has too few fields: {line:?}")]
    TooFewFields { line: String },

    /// The 10-character mode string could not be decoded.
    #[error("invalid mode string {mode:?}")]
    InvalidModeString { mode: String },

    /// The month token is not an English month abbreviation.
    #[error("invalid month name {token:?}")]
    InvalidMonth { token: String },

    /// A field that must be numeric was not.
    #[error("expected an integer, got {token:?}")]
    InvalidNumber { token: String },

    /// The date tokens do not form a valid calendar date.
    #[error("invalid calendar date in listing line: {detail}")]
    InvalidDate { detail: String },

    /// The time-of-day token could not be decoded.
    #[error("invalid time of day {token:?}")]
    InvalidTime { token: String },

    /// The name field contains `" -> "` more than once, so the symlink
    /// target cannot be told apart from the name.
    #[error("ambiguous symlink notation in name {name:?}")]
    AmbiguousLink { name: String },
}

/// The listing format a server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingFormat {
    /// Unix `ls -l` style lines.
    Unix,
    /// Microsoft/DOS style lines (`MM-DD-YY HH:MMAM <DIR>|size name`).
    Microsoft,
}

impl ListingFormat {
    /// The other format, used when probing fails.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            ListingFormat::Unix => ListingFormat::Microsoft,
            ListingFormat::Microsoft => ListingFormat::Unix,
        }
    }

    /// Whether `line` carries no entry data and must be skipped.
    ///
    /// Both formats ignore blank lines and the `total <digits>` summary
    /// some servers prepend.
    pub fn ignores(self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        let mut tokens = trimmed.split_whitespace();
        matches!(
            (tokens.next(), tokens.next(), tokens.next()),
            (Some("total"), Some(count), None)
                if count.bytes().all(|b| b.is_ascii_digit())
        )
    }

    /// Parse one listing line into a [`StatResult`].
    ///
    /// `time_shift` is the server-minus-client clock offset in seconds. The
    /// Unix parser needs it to resolve year-less timestamps; the Microsoft
    /// parser accepts it for interface symmetry only.
    pub fn parse_line(self, line: &str, time_shift: f64) -> Result<StatResult, ParseError> {
        self.parse_line_at(line, time_shift, clock::epoch_now())
    }

    /// Like [`parse_line`](Self::parse_line) with an explicit wall clock,
    /// so tests can pin "now".
    pub(crate) fn parse_line_at(
        self,
        line: &str,
        time_shift: f64,
        now: f64,
    ) -> Result<StatResult, ParseError> {
        match self {
            ListingFormat::Unix => unix::parse_line_at(line, time_shift, now),
            ListingFormat::Microsoft => msdos::parse_line(line),
        }
    }
}

impl std::fmt::Display for ListingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingFormat::Unix => write!(f, "Unix"),
            ListingFormat::Microsoft => write!(f, "Microsoft"),
        }
    }
}

/// Split a line into at most `limit` tokens.
///
/// Runs of whitespace separate tokens; the final token receives the
/// remainder of the line verbatim, so a name containing spaces survives.
/// Trailing line whitespace (including a stray `\r`) is dropped first.
pub(crate) fn split_tokens(line: &str, limit: usize) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_end().trim_start();
    while !rest.is_empty() {
        if tokens.len() + 1 == limit {
            tokens.push(rest);
            return tokens;
        }
        match rest.find(char::is_whitespace) {
            Some(i) => {
                tokens.push(&rest[..i]);
                rest = rest[i..].trim_start();
            }
            None => {
                tokens.push(rest);
                return tokens;
            }
        }
    }
    tokens
}
