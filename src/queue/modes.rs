//! Repeat and shuffle mode holders.
//!
//! Both modes are restored from preferences at start-up and written back on
//! every change; changes are also announced on the player state bus.

use std::sync::Arc;

use {
    parking_lot::RwLock,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{library::gateway::MusicPreferencesGateway, state::PlayerState};

/// Repeat behaviour at queue boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    None,
    /// Replay the current item when it ends.
    One,
    /// Wrap around at both ends.
    All,
}

impl RepeatMode {
    /// Next mode in the user-facing cycle: none, all, one.
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }
}

/// Current repeat mode, persisted through the preferences gateway.
pub struct RepeatModeState {
    mode: RwLock<RepeatMode>,
    preferences: Arc<dyn MusicPreferencesGateway>,
    player_state: PlayerState,
}

impl RepeatModeState {
    /// Restores the mode from preferences.
    #[must_use]
    pub fn new(preferences: Arc<dyn MusicPreferencesGateway>, player_state: PlayerState) -> Self {
        let mode = preferences.repeat_mode();
        debug!(?mode, "RepeatModeState: restored");
        Self {
            mode: RwLock::new(mode),
            preferences,
            player_state,
        }
    }

    #[must_use]
    pub fn get(&self) -> RepeatMode {
        *self.mode.read()
    }

    #[must_use]
    pub fn is_repeat_none(&self) -> bool {
        self.get() == RepeatMode::None
    }

    #[must_use]
    pub fn is_repeat_one(&self) -> bool {
        self.get() == RepeatMode::One
    }

    #[must_use]
    pub fn is_repeat_all(&self) -> bool {
        self.get() == RepeatMode::All
    }

    /// Sets an explicit mode.
    pub fn set(&self, mode: RepeatMode) {
        *self.mode.write() = mode;
        if let Err(e) = self.preferences.set_repeat_mode(mode) {
            warn!("RepeatModeState: failed to persist {mode:?}: {e}");
        }
        self.player_state.update_repeat_mode(mode);
    }

    /// Advances to the next mode in the cycle and returns it.
    pub fn update(&self) -> RepeatMode {
        let old = self.get();
        let new = old.cycle();
        self.set(new);
        debug!(?old, ?new, "RepeatModeState: updated");
        new
    }
}

/// Whether the active queue is in shuffled order.
pub struct ShuffleModeState {
    enabled: RwLock<bool>,
    preferences: Arc<dyn MusicPreferencesGateway>,
    player_state: PlayerState,
}

impl ShuffleModeState {
    #[must_use]
    pub fn new(preferences: Arc<dyn MusicPreferencesGateway>, player_state: PlayerState) -> Self {
        let enabled = preferences.is_shuffle_enabled();
        Self {
            enabled: RwLock::new(enabled),
            preferences,
            player_state,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        *self.enabled.read()
    }

    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut current = self.enabled.write();
            if *current == enabled {
                return;
            }
            *current = enabled;
        }
        if let Err(e) = self.preferences.set_shuffle_enabled(enabled) {
            warn!("ShuffleModeState: failed to persist {enabled}: {e}");
        }
        self.player_state.update_shuffle_mode(enabled);
    }

    /// Flips the mode and returns the new value.
    pub fn toggle(&self) -> bool {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled);
        enabled
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::{
        config::SettingsManager,
        library::gateway::MusicPreferencesGateway,
        queue::modes::{RepeatMode, RepeatModeState, ShuffleModeState},
        state::{PlayerState, PlayerStateEvent},
    };

    fn preferences(dir: &TempDir) -> Arc<SettingsManager> {
        Arc::new(SettingsManager::with_config_path(dir.path().join("settings.json")).unwrap())
    }

    #[test]
    fn test_repeat_cycle() {
        assert_eq!(RepeatMode::None.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::None);
    }

    #[tokio::test]
    async fn test_repeat_update_persists_and_broadcasts() {
        let dir = TempDir::new().unwrap();
        let prefs = preferences(&dir);
        let player_state = PlayerState::new();
        let mut rx = player_state.subscribe();

        let repeat = RepeatModeState::new(prefs.clone(), player_state);
        assert!(repeat.is_repeat_none());
        assert_eq!(repeat.update(), RepeatMode::All);
        assert!(repeat.is_repeat_all());
        assert_eq!(prefs.repeat_mode(), RepeatMode::All);
        assert!(matches!(
            rx.recv().await.unwrap(),
            PlayerStateEvent::RepeatModeChanged(RepeatMode::All)
        ));
    }

    #[test]
    fn test_shuffle_restored_and_toggled() {
        let dir = TempDir::new().unwrap();
        let prefs = preferences(&dir);
        prefs.set_shuffle_enabled(true).unwrap();

        let shuffle = ShuffleModeState::new(prefs.clone(), PlayerState::new());
        assert!(shuffle.is_enabled());
        assert!(!shuffle.toggle());
        assert!(!prefs.is_shuffle_enabled());
    }
}
