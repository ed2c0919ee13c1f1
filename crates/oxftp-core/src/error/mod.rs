//! Error types for the oxftp-core crate
//!
//! This module re-exports all error types and their context structures for
//! convenient importing throughout host code.

// Re-export error types from submodules
pub use crate::cache::lru::InvalidCapacity;
pub use crate::engine::StatError;
pub use crate::parse::ParseError;
pub use crate::session::SessionError;
pub use crate::timeshift::TimeShiftError;
