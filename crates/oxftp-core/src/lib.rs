//! Core library for OxFTP: a virtual filesystem layer over FTP.
//!
//! FTP exposes no native stat call, so this crate reconstructs file
//! metadata from directory-listing output. The centerpiece is
//! [`StatEngine`], which issues listing commands through a wire-level
//! [`FtpSession`] collaborator, parses each line with the active
//! [`ListingFormat`] parser (switching between the Unix and Microsoft
//! formats automatically), caches every entry it sees, and follows
//! symlink chains with cycle detection.
//!
//! The crate owns no sockets, no CLI, and no file-transfer logic: it is a
//! library consumed by a thin host that provides the session.
//!
//! # Example
//!
//! ```ignore
//! use oxftp_core::StatEngine;
//!
//! let mut engine = StatEngine::new(my_session);
//! engine.synchronize_times()?;
//! for name in engine.listdir("/pub")? {
//!     let stat = engine.stat(&format!("/pub/{name}"))?;
//!     println!("{name}: {:?} bytes", stat.size);
//! }
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod parse;
pub mod path;
pub mod session;
pub mod stat;
pub mod timeshift;

mod clock;

// Re-export commonly used types at crate root
pub use engine::{StatEngine, StatError};
pub use parse::{ListingFormat, ParseError};
pub use session::{FtpSession, SessionError};
pub use stat::{FileType, StatResult};
pub use timeshift::{TimeShift, TimeShiftError};
