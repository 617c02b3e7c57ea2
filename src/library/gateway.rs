//! Collaborator contracts the queue and the media-session services depend on.
//!
//! Storage-backed gateways are implemented by [`LibraryDatabase`]; the
//! preferences gateway by [`SettingsManager`]. Remote catalogues and the
//! notification surface are left to the embedding application.
//!
//! [`LibraryDatabase`]: crate::library::LibraryDatabase
//! [`SettingsManager`]: crate::config::SettingsManager

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::{LastMetadata, SettingsError},
    error::{LibraryError, QueueError, ServiceError},
    library::models::{FavoriteTrackType, MediaId, Scrobble, Song, SpotifyTrack},
    queue::{MediaEntity, RepeatMode},
};

/// Resolves categories and single tracks to library songs.
#[async_trait]
pub trait TrackGateway: Send + Sync {
    /// Ordered songs of a category.
    async fn get_song_list_by_param(&self, category: &MediaId) -> Result<Vec<Song>, LibraryError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Song>, LibraryError>;

    /// Looks a song up by its path or content URI.
    async fn get_by_uri(&self, uri: &str) -> Result<Option<Song>, LibraryError>;

    /// Songs of a category added within `window`, newest first.
    async fn get_recently_added(
        &self,
        category: &MediaId,
        window: Duration,
    ) -> Result<Vec<Song>, LibraryError>;
}

#[async_trait]
pub trait GenreGateway: Send + Sync {
    /// Songs tagged with a genre, matched case-insensitively by name.
    async fn get_songs_by_genre_name(&self, name: &str) -> Result<Vec<Song>, LibraryError>;
}

/// Persistence of the active queue between sessions.
#[async_trait]
pub trait PlayingQueueGateway: Send + Sync {
    async fn get_all(&self) -> Result<Vec<MediaEntity>, LibraryError>;

    /// Replaces the stored queue.
    async fn update(&self, items: &[MediaEntity]) -> Result<(), LibraryError>;
}

/// Per-episode resume positions.
#[async_trait]
pub trait PodcastPositionGateway: Send + Sync {
    /// Stored position in milliseconds, 0 when none was saved.
    async fn get(&self, id: i64) -> Result<i64, LibraryError>;

    async fn set(&self, id: i64, position_ms: i64) -> Result<(), LibraryError>;
}

#[async_trait]
pub trait FavoriteGateway: Send + Sync {
    async fn is_favorite(
        &self,
        id: i64,
        track_type: FavoriteTrackType,
    ) -> Result<bool, LibraryError>;
}

#[async_trait]
pub trait MostPlayedGateway: Send + Sync {
    /// Counts one play of a track inside the category it was reached from.
    async fn insert(&self, track: &MediaId) -> Result<(), LibraryError>;

    /// Songs of a category played at least `min_plays` times, most played first.
    async fn get_most_played(
        &self,
        category: &MediaId,
        min_plays: u32,
    ) -> Result<Vec<Song>, LibraryError>;
}

#[async_trait]
pub trait HistoryGateway: Send + Sync {
    async fn insert(&self, id: i64, is_podcast: bool) -> Result<(), LibraryError>;
}

#[async_trait]
pub trait LastPlayedGateway: Send + Sync {
    async fn insert_artist(&self, category: &MediaId) -> Result<(), LibraryError>;

    async fn insert_album(&self, category: &MediaId) -> Result<(), LibraryError>;
}

/// Remote catalogue used for 30 second previews.
#[async_trait]
pub trait SpotifyGateway: Send + Sync {
    async fn get_track(&self, track_id: &str) -> Result<Option<SpotifyTrack>, QueueError>;
}

/// Catalogue used when no remote service is configured; knows no tracks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSpotify;

#[async_trait]
impl SpotifyGateway for OfflineSpotify {
    async fn get_track(&self, _track_id: &str) -> Result<Option<SpotifyTrack>, QueueError> {
        Ok(None)
    }
}

/// Listen tracking service such as Last.fm.
#[async_trait]
pub trait ScrobbleGateway: Send + Sync {
    async fn scrobble(&self, scrobble: &Scrobble) -> Result<(), ServiceError>;

    async fn update_now_playing(&self, scrobble: &Scrobble) -> Result<(), ServiceError>;
}

/// Scrobbler used when no account is configured; accepts and drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineScrobbler;

#[async_trait]
impl ScrobbleGateway for OfflineScrobbler {
    async fn scrobble(&self, _scrobble: &Scrobble) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn update_now_playing(&self, _scrobble: &Scrobble) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Small synchronous key-value state restored on the next start.
pub trait MusicPreferencesGateway: Send + Sync {
    fn last_id_in_playlist(&self) -> i64;

    fn set_last_id_in_playlist(&self, id_in_playlist: i64) -> Result<(), SettingsError>;

    /// Last music offset in milliseconds.
    fn bookmark(&self) -> i64;

    fn set_bookmark(&self, bookmark_ms: i64) -> Result<(), SettingsError>;

    fn repeat_mode(&self) -> RepeatMode;

    fn set_repeat_mode(&self, mode: RepeatMode) -> Result<(), SettingsError>;

    fn is_shuffle_enabled(&self) -> bool;

    fn set_shuffle_enabled(&self, enabled: bool) -> Result<(), SettingsError>;

    fn last_metadata(&self) -> LastMetadata;

    fn set_last_metadata(&self, metadata: LastMetadata) -> Result<(), SettingsError>;
}
