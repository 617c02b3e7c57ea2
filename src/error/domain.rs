//! Domain-specific error types using `thiserror`.
//!
//! This module defines the main error enums for the storage, queue and
//! media-session layers of the engine.

use std::result::Result as StdResult;

use {anyhow::Error, async_channel::SendError, sqlx::Error as SqlxError, thiserror::Error};

use crate::{config::SettingsError, library::schema::SchemaError};

/// Library and storage errors.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
    /// Schema initialization error.
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),
    /// Stored row could not be mapped back into a model.
    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },
    /// Record not found.
    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: i64 },
}

/// Queue construction and transport errors.
#[derive(Error, Debug)]
pub enum QueueError {
    /// A gateway lookup failed.
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
    /// Preferences could not be read or written.
    #[error("Preferences error: {0}")]
    Preferences(#[from] SettingsError),
    /// A remote catalogue lookup failed.
    #[error("Remote lookup failed: {reason}")]
    Remote { reason: String },
}

/// Media-session service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The consumer loop behind a channel has already shut down.
    #[error("Service channel closed: {channel}")]
    ChannelClosed { channel: &'static str },
    /// Notification rendering failed.
    #[error("Notification error: {reason}")]
    Notification { reason: String },
    /// The scrobbling service rejected a submission.
    #[error("Scrobble failed: {reason}")]
    Scrobble { reason: String },
}

impl<T> From<SendError<T>> for ServiceError {
    fn from(_: SendError<T>) -> Self {
        Self::ChannelClosed { channel: "event" }
    }
}

/// Operational error context propagation with `anyhow`.
///
/// Used for best-effort work that needs rich context but no specific
/// handling logic.
pub type Result<T> = StdResult<T, Error>;

#[cfg(test)]
mod tests {
    use crate::error::domain::{LibraryError, QueueError, ServiceError};

    #[test]
    fn test_library_error_display() {
        let not_found_error = LibraryError::NotFound {
            entity: "song".to_string(),
            id: 123,
        };
        assert_eq!(
            not_found_error.to_string(),
            "Record not found: song with id 123"
        );

        let invalid_data_error = LibraryError::InvalidData {
            reason: "bad media id".to_string(),
        };
        assert_eq!(invalid_data_error.to_string(), "Invalid data: bad media id");
    }

    #[test]
    fn test_queue_error_wraps_library_error() {
        let error = QueueError::from(LibraryError::InvalidData {
            reason: "x".to_string(),
        });
        assert_eq!(error.to_string(), "Library error: Invalid data: x");

        let remote = QueueError::Remote {
            reason: "timeout".to_string(),
        };
        assert_eq!(remote.to_string(), "Remote lookup failed: timeout");
    }

    #[test]
    fn test_service_error_from_send_error() {
        let error = ServiceError::from(async_channel::SendError(1_u8));
        assert_eq!(error.to_string(), "Service channel closed: event");

        let render = ServiceError::Notification {
            reason: "no channel".to_string(),
        };
        assert_eq!(render.to_string(), "Notification error: no channel");

        let scrobble = ServiceError::Scrobble {
            reason: "bad session".to_string(),
        };
        assert_eq!(scrobble.to_string(), "Scrobble failed: bad session");
    }
}
