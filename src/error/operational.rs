//! Operational error context propagation with `anyhow`.
//!
//! Side effects such as history writes or favorite lookups must never break
//! playback control. They attach context with [`ResultExt`] and hand the
//! failure to [`ErrorReporter`], which logs it and moves on.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{debug, error, warn},
};

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Severity used when a swallowed failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected noise, e.g. a lookup for a track that has since disappeared.
    Debug,
    /// Recoverable problem worth surfacing.
    Warn,
    /// A side effect was lost.
    Error,
}

/// Centralized reporting for best-effort failures.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Logs an error chain with the given severity.
    pub fn report(error: &Error, context: &str, severity: Severity) {
        let chain = format!("{error:#}");
        match severity {
            Severity::Debug => debug!(context, error = %chain, "Swallowed error"),
            Severity::Warn => warn!(context, error = %chain, "Swallowed error"),
            Severity::Error => error!(context, error = %chain, "Swallowed error"),
        }
    }

    /// Logs a failed result at error level and converts it to an `Option`.
    ///
    /// # Arguments
    ///
    /// * `result` - Outcome of a best-effort operation
    /// * `context` - Short description of the operation for the log line
    ///
    /// # Returns
    ///
    /// The success value, or `None` when the operation failed.
    pub fn swallow<T>(result: AnyhowResult<T>, context: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                Self::report(&e, context, Severity::Error);
                None
            }
        }
    }
}
