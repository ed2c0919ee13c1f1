//! Wire-level session abstraction.
//!
//! This module defines the seam between the stat engine and the underlying
//! FTP control connection. The engine never opens sockets or speaks the
//! protocol itself; it issues the handful of operations below and wraps any
//! failure with the path and operation it was attempting.
//!
//! # Contract
//!
//! A session is used by at most one engine at a time. All operations block
//! until the server has answered; timeouts are the implementation's
//! responsibility and surface as ordinary [`SessionError`]s.

use thiserror::Error;

/// Errors produced by a session implementation.
///
/// The engine propagates these unchanged apart from attaching the attempted
/// path and operation; it never interprets protocol-level failures.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport-level I/O failure (connection reset, timeout, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Temporary server failure (FTP 4xx reply). Retrying may succeed.
    #[error("temporary server error {code}: {message}")]
    Temporary { code: u32, message: String },

    /// Permanent server failure (FTP 5xx reply).
    #[error("permanent server error {code}: {message}")]
    Permanent { code: u32, message: String },

    /// Anything that doesn't fit the categories above.
    #[error("session error: {message}")]
    Other { message: String },
}

/// A live connection to an FTP server, as consumed by the stat engine.
///
/// Implementations wrap a concrete FTP client. The engine only ever issues
/// the operations below; in particular it reconstructs all file metadata
/// from [`raw_listing`](FtpSession::raw_listing) output, because the
/// protocol has no native stat call.
pub trait FtpSession {
    /// The server-side current directory, as an absolute remote path.
    fn current_dir(&mut self) -> Result<String, SessionError>;

    /// Change the server-side current directory.
    fn change_dir(&mut self, path: &str) -> Result<(), SessionError>;

    /// Retrieve the raw directory listing of `path`.
    ///
    /// The callback is invoked once per raw text line, in the order the
    /// server sent them. Line terminators are already stripped.
    fn raw_listing(
        &mut self,
        path: &str,
        callback: &mut dyn FnMut(&str),
    ) -> Result<(), SessionError>;

    /// Create a uniquely-named empty file in the current remote directory
    /// and return its name.
    ///
    /// Used for clock synchronization; the caller deletes the file again.
    fn make_temp_file(&mut self) -> Result<String, SessionError>;

    /// Delete a remote file.
    fn delete(&mut self, path: &str) -> Result<(), SessionError>;

    /// Create a remote directory.
    fn make_dir(&mut self, path: &str) -> Result<(), SessionError>;

    /// Remove an empty remote directory.
    fn remove_dir(&mut self, path: &str) -> Result<(), SessionError>;

    /// Rename a remote file or directory.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), SessionError>;
}
