//! Player preferences and engine tunables with XDG Base Directory compliance.
//!
//! The same JSON file carries the state the engine restores on the next start
//! (last queue position, bookmark, repeat and shuffle modes) and the knobs that
//! shape queue behaviour.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

use crate::{library::gateway::MusicPreferencesGateway, queue::RepeatMode};

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Title and artist of the last track handed to the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMetadata {
    /// Track title.
    pub title: String,
    /// Track artist.
    pub subtitle: String,
    /// Track id.
    pub id: i64,
}

/// Serializable user settings structure with default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// `id_in_playlist` of the item that was current when the queue last moved.
    pub last_id_in_playlist: i64,
    /// Last known music playback offset in milliseconds.
    pub bookmark_ms: i64,
    /// Persisted repeat mode.
    pub repeat_mode: RepeatMode,
    /// Whether the active queue was built shuffled.
    pub shuffle_enabled: bool,
    /// Last track handed to the player.
    pub last_metadata: LastMetadata,
    /// Offset below which "previous" goes to the previous track instead of restarting.
    pub skip_to_previous_threshold_ms: i64,
    /// Window for the recently added intent, in days.
    pub recently_added_days: u32,
    /// Minimum play count for a track to show up as most played.
    pub most_played_min_plays: u32,
    /// Upper bound on enhanced shuffle repair passes.
    pub shuffle_max_passes: usize,
    /// Delay before a started track is scrobbled.
    pub scrobble_delay_ms: u64,
    /// Capacity of the notification and side-effect work queues.
    pub event_channel_capacity: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_id_in_playlist: 0,
            bookmark_ms: 0,
            repeat_mode: RepeatMode::None,
            shuffle_enabled: false,
            last_metadata: LastMetadata::default(),
            skip_to_previous_threshold_ms: 10_000,
            recently_added_days: 14,
            most_played_min_plays: 5,
            shuffle_max_passes: 3,
            scrobble_delay_ms: 10_000,
            event_channel_capacity: 64,
            log_filter: "playqueue=info".to_string(),
        }
    }
}

/// Handles loading, saving, and validation of user preferences.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe user settings storage.
    settings: RwLock<UserSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl SettingsManager {
    /// Creates a new settings manager with default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path (for testing).
    ///
    /// # Arguments
    ///
    /// * `config_path` - Custom path for the settings file
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded or are invalid.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = config_path.parent() {
            create_dir_all(parent)?;
        }

        let settings: UserSettings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            from_str(&contents)?
        } else {
            debug!("Creating new default settings file: {:?}", config_path);
            UserSettings::default()
        };
        validate(&settings)?;

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Replaces the settings and saves them to disk.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the new settings are invalid or cannot be saved.
    pub fn update_settings(&self, new_settings: UserSettings) -> Result<(), SettingsError> {
        validate(&new_settings)?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    /// Applies an in-place edit and saves the result.
    fn modify(&self, edit: impl FnOnce(&mut UserSettings)) -> Result<(), SettingsError> {
        edit(&mut *self.settings.write());
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

fn validate(settings: &UserSettings) -> Result<(), SettingsError> {
    if settings.event_channel_capacity == 0 {
        return Err(SettingsError::InvalidValue {
            reason: "event_channel_capacity must be at least 1".to_string(),
        });
    }
    if settings.skip_to_previous_threshold_ms < 0 {
        return Err(SettingsError::InvalidValue {
            reason: "skip_to_previous_threshold_ms must not be negative".to_string(),
        });
    }
    Ok(())
}

impl MusicPreferencesGateway for SettingsManager {
    fn last_id_in_playlist(&self) -> i64 {
        self.settings.read().last_id_in_playlist
    }

    fn set_last_id_in_playlist(&self, id_in_playlist: i64) -> Result<(), SettingsError> {
        self.modify(|s| s.last_id_in_playlist = id_in_playlist)
    }

    fn bookmark(&self) -> i64 {
        self.settings.read().bookmark_ms
    }

    fn set_bookmark(&self, bookmark_ms: i64) -> Result<(), SettingsError> {
        self.modify(|s| s.bookmark_ms = bookmark_ms)
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.settings.read().repeat_mode
    }

    fn set_repeat_mode(&self, mode: RepeatMode) -> Result<(), SettingsError> {
        self.modify(|s| s.repeat_mode = mode)
    }

    fn is_shuffle_enabled(&self) -> bool {
        self.settings.read().shuffle_enabled
    }

    fn set_shuffle_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.modify(|s| s.shuffle_enabled = enabled)
    }

    fn last_metadata(&self) -> LastMetadata {
        self.settings.read().last_metadata.clone()
    }

    fn set_last_metadata(&self, metadata: LastMetadata) -> Result<(), SettingsError> {
        self.modify(|s| s.last_metadata = metadata)
    }
}

/// Path of the settings file under the XDG config home.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_xdg_home("XDG_CONFIG_HOME", ".config");
    config_dir.push("playqueue");
    config_dir.push("settings.json");
    config_dir
}

/// Path of the SQLite database under the XDG data home.
#[must_use]
pub fn get_database_path() -> PathBuf {
    let mut data_dir = get_xdg_home("XDG_DATA_HOME", ".local/share");
    data_dir.push("playqueue");
    data_dir.push("library.db");
    data_dir
}

/// Resolves an XDG base directory, falling back to `$HOME/<fallback>`.
fn get_xdg_home(variable: &str, fallback: &str) -> PathBuf {
    if let Ok(dir) = var(variable)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(fallback);
        return path;
    }

    PathBuf::from(".")
}
