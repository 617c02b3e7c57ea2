//! Voice search query interpretation.
//!
//! A raw spoken query plus optional structured extras is reduced to a single
//! `SearchFocus`, which then selects and filters library songs.

use crate::{
    library::{MediaId, Song},
    queue::{MediaEntity, media_entity::song_matches},
};

/// Structured hint attached to a voice query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    Album,
    Artist,
    Song,
    Genre,
}

/// Optional extras that accompany a voice query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceSearchExtras {
    pub focus: Option<FocusKind>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
}

/// What a voice query asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFocus {
    /// "Play some music": everything, shuffled.
    Any,
    /// Free text matched against title, artist and album.
    Unstructured(String),
    Album(String),
    Artist(String),
    Song(String),
    Genre(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSearchParams {
    pub focus: SearchFocus,
}

impl VoiceSearchParams {
    /// Resolves the focus. A focused search whose field is missing falls back
    /// to the raw query.
    #[must_use]
    pub fn new(query: &str, extras: &VoiceSearchExtras) -> Self {
        let query = query.trim();
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let focused = match extras.focus {
            Some(FocusKind::Album) => field(&extras.album).map(SearchFocus::Album),
            Some(FocusKind::Artist) => field(&extras.artist).map(SearchFocus::Artist),
            Some(FocusKind::Song) => field(&extras.title).map(SearchFocus::Song),
            Some(FocusKind::Genre) => field(&extras.genre).map(SearchFocus::Genre),
            None => None,
        };

        let focus = match focused {
            Some(focus) => focus,
            None if query.is_empty() => SearchFocus::Any,
            None => SearchFocus::Unstructured(query.to_string()),
        };
        Self { focus }
    }
}

/// Applies `focus` to `songs`. Genre focus is resolved by the caller, so the
/// songs for it are already the genre's songs and pass through unfiltered.
#[must_use]
pub fn filter(songs: &[Song], focus: &SearchFocus) -> Vec<MediaEntity> {
    let keep = |song: &Song| match focus {
        SearchFocus::Any | SearchFocus::Genre(_) => true,
        SearchFocus::Unstructured(query) => {
            song_matches(&song.title, &song.artist, &song.album, Some(query))
        }
        SearchFocus::Album(name) => song.album.eq_ignore_ascii_case(name),
        SearchFocus::Artist(name) => song.artist.eq_ignore_ascii_case(name),
        SearchFocus::Song(title) => song.title.eq_ignore_ascii_case(title),
    };

    let parent = MediaId::songs_category();
    songs
        .iter()
        .filter(|song| keep(song))
        .zip(0..)
        .map(|(song, index)| MediaEntity::from_song(song, index, &parent))
        .collect()
}
