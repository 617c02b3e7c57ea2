//! Queue item model and the position classification derived from it.

use serde::{Deserialize, Serialize};

use crate::library::{MediaId, Song};

/// One item of the playing queue.
///
/// Identity is `(id, id_in_playlist)`: the same song may appear several times
/// in a queue, each occurrence with its own `id_in_playlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntity {
    /// Library song id.
    pub id: i64,
    /// Ordering key, unique within a queue snapshot.
    pub id_in_playlist: i64,
    /// Track id including the category the song was reached from.
    pub media_id: MediaId,
    pub artist_id: i64,
    pub album_id: i64,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub duration_ms: i64,
    /// Source path or URI.
    pub path: String,
    pub track_number: i64,
    pub disc_number: i64,
    pub is_podcast: bool,
}

impl MediaEntity {
    /// Builds a queue item for `song` reached through `parent`.
    #[must_use]
    pub fn from_song(song: &Song, id_in_playlist: i64, parent: &MediaId) -> Self {
        Self {
            id: song.id,
            id_in_playlist,
            media_id: MediaId::track(parent.kind(), parent.category_id(), song.id),
            artist_id: song.artist_id,
            album_id: song.album_id,
            title: song.title.clone(),
            artist: song.artist.clone(),
            album_artist: song.album_artist.clone(),
            album: song.album.clone(),
            duration_ms: song.duration_ms,
            path: song.path.clone(),
            track_number: song.track_number,
            disc_number: song.disc_number,
            is_podcast: song.is_podcast,
        }
    }

    /// Case-insensitive substring match on title, artist or album.
    ///
    /// A blank filter matches everything.
    #[must_use]
    pub fn matches_filter(&self, filter: Option<&str>) -> bool {
        song_matches(&self.title, &self.artist, &self.album, filter)
    }
}

/// Shared filter used on library songs before they become queue items.
pub(crate) fn song_matches(title: &str, artist: &str, album: &str, filter: Option<&str>) -> bool {
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return true;
    };
    let needle = filter.to_lowercase();
    [title, artist, album]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Where the current item sits relative to the queue boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionInQueue {
    First,
    Last,
    FirstAndLast,
    InMiddle,
}

impl PositionInQueue {
    /// Classifies `position` in a queue of `len` items.
    ///
    /// With `wraps` set (repeat-all) both neighbours always exist.
    #[must_use]
    pub fn compute(position: usize, len: usize, wraps: bool) -> Self {
        if wraps {
            return Self::InMiddle;
        }
        let is_first = position == 0;
        let is_last = position + 1 >= len;
        match (is_first, is_last) {
            (true, true) => Self::FirstAndLast,
            (true, false) => Self::First,
            (false, true) => Self::Last,
            (false, false) => Self::InMiddle,
        }
    }

    /// Position after items were appended behind the current one.
    ///
    /// The queue can no longer end at the current item.
    #[must_use]
    pub fn after_insertion(self) -> Self {
        match self {
            Self::FirstAndLast => Self::First,
            Self::Last => Self::InMiddle,
            other => other,
        }
    }
}

/// Queue item handed to the player, with its resume offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMediaEntity {
    pub entity: MediaEntity,
    pub position_in_queue: PositionInQueue,
    /// Offset in milliseconds the player should seek to before starting.
    pub bookmark_ms: i64,
}
