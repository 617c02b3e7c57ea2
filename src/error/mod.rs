//! Error handling for the playback engine using `thiserror` and `anyhow`.
//!
//! Domain enums describe failures callers may branch on; the operational
//! helpers attach context to best-effort work whose failures are only logged.

pub mod domain;
pub mod operational;

pub use {
    domain::{LibraryError, QueueError, ServiceError},
    operational::{ErrorReporter, ResultExt, Severity},
};
