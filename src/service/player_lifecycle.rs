//! Player lifecycle fan-out.
//!
//! The player reports prepare, metadata and playback state changes here.
//! `PlayerLifecycle` mirrors them into [`PlayerState`] and then awaits every
//! registered listener in registration order, so a listener backed by a
//! bounded queue slows the player down instead of dropping work.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use {async_trait::async_trait, parking_lot::RwLock, tracing::debug};

use crate::{queue::MediaEntity, state::PlayerState};

/// Coarse player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Paused,
    Playing,
    Buffering,
}

/// Player state with the offset it was reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub position_ms: i64,
}

impl PlaybackStatus {
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

/// Receives player lifecycle callbacks. All methods default to no-ops.
#[async_trait]
pub trait PlayerLifecycleListener: Send + Sync {
    /// The player restored an item without starting it.
    async fn on_prepare(&self, _entity: &MediaEntity) {}

    /// The player switched to a new item.
    async fn on_metadata_changed(&self, _entity: &MediaEntity) {}

    async fn on_state_changed(&self, _status: PlaybackStatus) {}
}

/// Handle returned by [`PlayerLifecycle::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of lifecycle listeners.
pub struct PlayerLifecycle {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn PlayerLifecycleListener>)>>,
    next_id: AtomicU64,
    player_state: PlayerState,
}

impl PlayerLifecycle {
    #[must_use]
    pub fn new(player_state: PlayerState) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            player_state,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn PlayerLifecycleListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        debug!(?id, "PlayerLifecycle: listener added");
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    pub async fn prepare(&self, entity: &MediaEntity) {
        debug!(id = entity.id, "PlayerLifecycle: prepare");
        self.player_state.update_current_track(Some(entity.clone()));
        for listener in self.snapshot() {
            listener.on_prepare(entity).await;
        }
    }

    pub async fn metadata_changed(&self, entity: &MediaEntity) {
        debug!(id = entity.id, title = %entity.title, "PlayerLifecycle: metadata changed");
        self.player_state.update_current_track(Some(entity.clone()));
        for listener in self.snapshot() {
            listener.on_metadata_changed(entity).await;
        }
    }

    pub async fn state_changed(&self, status: PlaybackStatus) {
        debug!(?status, "PlayerLifecycle: state changed");
        self.player_state.update_playback_status(status);
        for listener in self.snapshot() {
            listener.on_state_changed(status).await;
        }
    }

    // Listeners are cloned out so none is awaited under the lock.
    fn snapshot(&self) -> Vec<Arc<dyn PlayerLifecycleListener>> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}
