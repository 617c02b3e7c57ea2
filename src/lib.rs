//! Playqueue - playing queue engine for a music player
//!
//! Owns the active queue of a music or podcast player: builds queues from
//! play intents, navigates them under repeat and shuffle modes, persists them
//! across sessions, and keeps the media notification and play statistics in
//! step with the player.

pub mod config;
pub mod error;
pub mod library;
pub mod queue;
pub mod service;
pub mod state;

// Re-export key types for convenience
pub use {
    config::{SettingsManager, UserSettings},
    error::{LibraryError, QueueError, ServiceError},
    library::{LibraryDatabase, MediaId, MediaIdCategory, Song},
    queue::{MediaEntity, PlayerMediaEntity, PositionInQueue, QueueManager, RepeatMode},
    service::{CurrentSong, MusicNotificationManager, PlaybackState, PlayerLifecycle},
    state::{PlayerState, PlayerStateEvent},
};
