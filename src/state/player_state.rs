//! Global player state with broadcast update notifications.
//!
//! `PlayerState` mirrors what the engine currently exposes (queue snapshot,
//! current track, playback status, modes) and fans every change out to
//! subscribers through a `tokio` broadcast channel.

use std::sync::Arc;

use {
    parking_lot::RwLock,
    tokio::sync::broadcast::{Receiver, Sender, channel},
};

use crate::{
    library::FavoriteItemState,
    queue::{MediaEntity, RepeatMode},
    service::{PlaybackState, PlaybackStatus},
};

const EVENT_BUFFER: usize = 64;

/// Immutable snapshot of the active queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayingQueue {
    /// Ordered queue items.
    pub items: Vec<MediaEntity>,
    /// Index of the current item; `None` iff `items` is empty.
    pub current_index: Option<usize>,
}

impl PlayingQueue {
    /// The item at the current index.
    #[must_use]
    pub fn current(&self) -> Option<&MediaEntity> {
        self.current_index.and_then(|i| self.items.get(i))
    }
}

/// Player state change events.
#[derive(Debug, Clone)]
pub enum PlayerStateEvent {
    /// Queue content or position changed.
    QueueChanged(PlayingQueue),
    /// The track handed to the player changed.
    CurrentTrackChanged(Option<MediaEntity>),
    /// Playback status changed.
    PlaybackStatusChanged(PlaybackStatus),
    RepeatModeChanged(RepeatMode),
    ShuffleModeChanged(bool),
    /// Favorite status of the current track was recomputed.
    FavoriteChanged(FavoriteItemState),
}

/// Central state container with thread-safe access.
#[derive(Debug, Clone)]
pub struct PlayerState {
    queue: Arc<RwLock<PlayingQueue>>,
    current_track: Arc<RwLock<Option<MediaEntity>>>,
    playback: Arc<RwLock<PlaybackStatus>>,
    state_tx: Sender<PlayerStateEvent>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerState {
    /// Creates an empty player state.
    #[must_use]
    pub fn new() -> Self {
        let (state_tx, _) = channel(EVENT_BUFFER);

        Self {
            queue: Arc::new(RwLock::new(PlayingQueue::default())),
            current_track: Arc::new(RwLock::new(None)),
            playback: Arc::new(RwLock::new(PlaybackStatus {
                state: PlaybackState::Stopped,
                position_ms: 0,
            })),
            state_tx,
        }
    }

    /// Stores a queue snapshot and notifies subscribers.
    pub fn update_queue(&self, queue: PlayingQueue) {
        *self.queue.write() = queue.clone();
        let _ = self.state_tx.send(PlayerStateEvent::QueueChanged(queue));
    }

    /// Updates the current track and notifies subscribers.
    pub fn update_current_track(&self, track: Option<MediaEntity>) {
        *self.current_track.write() = track.clone();
        let _ = self
            .state_tx
            .send(PlayerStateEvent::CurrentTrackChanged(track));
    }

    /// Updates the playback status and notifies subscribers.
    pub fn update_playback_status(&self, status: PlaybackStatus) {
        *self.playback.write() = status;
        let _ = self
            .state_tx
            .send(PlayerStateEvent::PlaybackStatusChanged(status));
    }

    pub fn update_repeat_mode(&self, mode: RepeatMode) {
        let _ = self.state_tx.send(PlayerStateEvent::RepeatModeChanged(mode));
    }

    pub fn update_shuffle_mode(&self, enabled: bool) {
        let _ = self
            .state_tx
            .send(PlayerStateEvent::ShuffleModeChanged(enabled));
    }

    pub fn update_favorite(&self, favorite: FavoriteItemState) {
        let _ = self
            .state_tx
            .send(PlayerStateEvent::FavoriteChanged(favorite));
    }

    /// Subscribes to player state changes.
    pub fn subscribe(&self) -> Receiver<PlayerStateEvent> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn get_queue(&self) -> PlayingQueue {
        self.queue.read().clone()
    }

    #[must_use]
    pub fn get_current_track(&self) -> Option<MediaEntity> {
        self.current_track.read().clone()
    }

    #[must_use]
    pub fn get_playback_status(&self) -> PlaybackStatus {
        *self.playback.read()
    }
}
