//! Data models shared by the library gateways and the queue.
//!
//! `MediaId` names a browsable category (an album, a playlist, all songs...)
//! or a track inside one. `Song` is a library row.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use {
    serde::{Deserialize, Serialize},
    sqlx::FromRow,
};

use crate::error::LibraryError;

/// Kind of collection a media id points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaIdCategory {
    Folders,
    Playlists,
    Songs,
    Albums,
    Artists,
    Genres,
    Podcasts,
    PodcastPlaylists,
    PodcastAlbums,
    PodcastArtists,
    SpotifyTracks,
}

impl MediaIdCategory {
    const ALL: [MediaIdCategory; 11] = [
        Self::Folders,
        Self::Playlists,
        Self::Songs,
        Self::Albums,
        Self::Artists,
        Self::Genres,
        Self::Podcasts,
        Self::PodcastPlaylists,
        Self::PodcastAlbums,
        Self::PodcastArtists,
        Self::SpotifyTracks,
    ];

    /// Stable tag used in the textual form of a media id.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Folders => "FOLDERS",
            Self::Playlists => "PLAYLISTS",
            Self::Songs => "SONGS",
            Self::Albums => "ALBUMS",
            Self::Artists => "ARTISTS",
            Self::Genres => "GENRES",
            Self::Podcasts => "PODCASTS",
            Self::PodcastPlaylists => "PODCASTS_PLAYLIST",
            Self::PodcastAlbums => "PODCASTS_ALBUMS",
            Self::PodcastArtists => "PODCASTS_ARTISTS",
            Self::SpotifyTracks => "SPOTIFY_TRACKS",
        }
    }

    /// Whether the category only holds podcast episodes.
    #[must_use]
    pub fn is_podcast(self) -> bool {
        matches!(
            self,
            Self::Podcasts | Self::PodcastPlaylists | Self::PodcastAlbums | Self::PodcastArtists
        )
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

/// Identifier of a category or of a track within a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaId {
    /// A whole collection, e.g. one album.
    Category {
        category: MediaIdCategory,
        category_id: String,
    },
    /// A track reached through a collection.
    Track {
        category: MediaIdCategory,
        category_id: String,
        id: i64,
    },
}

impl MediaId {
    /// Builds a category id.
    pub fn category(category: MediaIdCategory, category_id: impl Into<String>) -> Self {
        Self::Category {
            category,
            category_id: category_id.into(),
        }
    }

    /// Builds a track id inside a category.
    pub fn track(category: MediaIdCategory, category_id: impl Into<String>, id: i64) -> Self {
        Self::Track {
            category,
            category_id: category_id.into(),
            id,
        }
    }

    /// The "all songs" category.
    #[must_use]
    pub fn songs_category() -> Self {
        Self::category(MediaIdCategory::Songs, "")
    }

    /// The category part of this id.
    #[must_use]
    pub fn parent_id(&self) -> MediaId {
        match self {
            Self::Category { .. } => self.clone(),
            Self::Track {
                category,
                category_id,
                ..
            } => Self::category(*category, category_id.clone()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> MediaIdCategory {
        match self {
            Self::Category { category, .. } | Self::Track { category, .. } => *category,
        }
    }

    #[must_use]
    pub fn category_id(&self) -> &str {
        match self {
            Self::Category { category_id, .. } | Self::Track { category_id, .. } => category_id,
        }
    }

    /// Track id, or `None` for a category.
    #[must_use]
    pub fn track_id(&self) -> Option<i64> {
        match self {
            Self::Category { .. } => None,
            Self::Track { id, .. } => Some(*id),
        }
    }
}

impl Display for MediaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Category {
                category,
                category_id,
            } => write!(f, "{}/{category_id}", category.tag()),
            Self::Track {
                category,
                category_id,
                id,
            } => write!(f, "{}/{category_id}|{id}", category.tag()),
        }
    }
}

impl FromStr for MediaId {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LibraryError::InvalidData {
            reason: format!("malformed media id: {s}"),
        };

        let (tag, rest) = s.split_once('/').ok_or_else(invalid)?;
        let category = MediaIdCategory::from_tag(tag).ok_or_else(invalid)?;

        match rest.rsplit_once('|') {
            Some((category_id, id)) => {
                let id = id.parse::<i64>().map_err(|_| invalid())?;
                Ok(Self::track(category, category_id, id))
            }
            None => Ok(Self::category(category, rest)),
        }
    }
}

/// Represents a track or podcast episode in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Song {
    /// Unique database ID.
    pub id: i64,
    pub artist_id: i64,
    pub album_id: i64,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    /// Duration in milliseconds.
    pub duration_ms: i64,
    /// Unix timestamp (seconds) when the file entered the library.
    pub date_added: i64,
    /// File system path or content URI of the audio file.
    pub path: String,
    /// Track number within the album.
    pub track_number: i64,
    /// Disc number (defaults to 1).
    pub disc_number: i64,
    pub is_podcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Song {
    /// Category that lists every item of this kind.
    #[must_use]
    pub fn parent_media_id(&self) -> MediaId {
        if self.is_podcast {
            MediaId::category(MediaIdCategory::Podcasts, "")
        } else {
            MediaId::songs_category()
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self {
            id: 0,
            artist_id: 0,
            album_id: 0,
            title: String::new(),
            artist: String::new(),
            album_artist: String::new(),
            album: String::new(),
            duration_ms: 0,
            date_added: 0,
            path: String::new(),
            track_number: 0,
            disc_number: 1,
            is_podcast: false,
            genre: None,
        }
    }
}

/// Whether a favorite lookup targets the music or the podcast list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteTrackType {
    Track,
    Podcast,
}

/// Favorite flag of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoriteState {
    Favorite,
    NotFavorite,
}

/// Favorite status published when the current track changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItemState {
    pub id: i64,
    pub state: FavoriteState,
    pub track_type: FavoriteTrackType,
}

/// Track metadata returned by the Spotify catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub disc_number: i64,
    pub track_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Listen submitted to a scrobbling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scrobble {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub duration_ms: i64,
    pub track_number: i64,
    /// Unix timestamp (seconds) of the listen.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::{from_str, to_string};

    use crate::library::models::{MediaId, MediaIdCategory, Song};

    #[test]
    fn test_media_id_text_form() {
        let track = MediaId::track(MediaIdCategory::Albums, "12", 7);
        assert_eq!(track.to_string(), "ALBUMS/12|7");
        assert_eq!("ALBUMS/12|7".parse::<MediaId>().unwrap(), track);

        let category = MediaId::songs_category();
        assert_eq!(category.to_string(), "SONGS/");
        assert_eq!("SONGS/".parse::<MediaId>().unwrap(), category);

        let spotify = MediaId::track(MediaIdCategory::SpotifyTracks, "spotify:track:abc", 0);
        assert_eq!(spotify.to_string().parse::<MediaId>().unwrap(), spotify);
    }

    #[test]
    fn test_media_id_rejects_garbage() {
        assert!("nope".parse::<MediaId>().is_err());
        assert!("UNKNOWN/1".parse::<MediaId>().is_err());
        assert!("ALBUMS/1|x".parse::<MediaId>().is_err());
    }

    #[test]
    fn test_parent_id_drops_track() {
        let track = MediaId::track(MediaIdCategory::Playlists, "3", 99);
        assert_eq!(
            track.parent_id(),
            MediaId::category(MediaIdCategory::Playlists, "3")
        );
        assert_eq!(track.track_id(), Some(99));
        assert_eq!(track.parent_id().track_id(), None);
    }

    #[test]
    fn test_podcast_categories() {
        assert!(MediaIdCategory::PodcastArtists.is_podcast());
        assert!(!MediaIdCategory::Artists.is_podcast());
    }

    #[test]
    fn test_song_serialization_and_parent() {
        let song = Song {
            id: 1,
            title: "Test".to_string(),
            is_podcast: true,
            ..Song::default()
        };
        let deserialized: Song = from_str(&to_string(&song).unwrap()).unwrap();
        assert_eq!(song, deserialized);
        assert_eq!(song.parent_media_id().kind(), MediaIdCategory::Podcasts);
    }
}
