//! Play intents and transport controls on top of [`QueueImpl`].
//!
//! Each intent resolves a song list, builds queue items indexed from zero,
//! picks the starting item, hands the list to `QueueImpl` for broadcast and
//! persistence, and returns the item the player should load together with
//! its position in the queue and resume offset.

use std::sync::Arc;

use {rand::seq::SliceRandom, tracing::debug};

use crate::{
    error::{ErrorReporter, QueueError, ResultExt},
    library::{
        LibraryDatabase, MediaId, Song, SpotifyTrack,
        gateway::{
            GenreGateway, MostPlayedGateway, MusicPreferencesGateway, PlayingQueueGateway,
            PodcastPositionGateway, SpotifyGateway, TrackGateway,
        },
    },
    queue::{
        EnhancedShuffle, MediaEntity, PlayerMediaEntity, PositionInQueue, QueueImpl,
        QueueTunables, RepeatModeState, SearchFocus, ShuffleModeState, VoiceSearchExtras,
        VoiceSearchParams, media_entity::song_matches, voice_search,
    },
    state::PlayerState,
};

const SPOTIFY_PREVIEW_MS: i64 = 30_000;

/// Collaborators the queue manager reads from and writes to.
#[derive(Clone)]
pub struct QueueGateways {
    pub tracks: Arc<dyn TrackGateway>,
    pub genres: Arc<dyn GenreGateway>,
    pub playing_queue: Arc<dyn PlayingQueueGateway>,
    pub podcast_positions: Arc<dyn PodcastPositionGateway>,
    pub most_played: Arc<dyn MostPlayedGateway>,
    pub spotify: Arc<dyn SpotifyGateway>,
    pub preferences: Arc<dyn MusicPreferencesGateway>,
}

impl QueueGateways {
    /// Wires every storage gateway to `database`.
    #[must_use]
    pub fn from_database(
        database: &LibraryDatabase,
        preferences: Arc<dyn MusicPreferencesGateway>,
        spotify: Arc<dyn SpotifyGateway>,
    ) -> Self {
        let database = Arc::new(database.clone());
        Self {
            tracks: database.clone(),
            genres: database.clone(),
            playing_queue: database.clone(),
            podcast_positions: database.clone(),
            most_played: database,
            spotify,
            preferences,
        }
    }
}

/// Turns play intents into queues and answers transport requests.
pub struct QueueManager {
    queue: QueueImpl,
    gateways: QueueGateways,
    repeat_mode: Arc<RepeatModeState>,
    shuffle_mode: Arc<ShuffleModeState>,
    enhanced_shuffle: EnhancedShuffle,
    tunables: QueueTunables,
}

impl QueueManager {
    /// Creates a manager with an empty queue. Modes are restored from
    /// preferences; call [`prepare`](Self::prepare) to restore the queue.
    #[must_use]
    pub fn new(
        gateways: QueueGateways,
        player_state: PlayerState,
        tunables: QueueTunables,
    ) -> Self {
        let repeat_mode = Arc::new(RepeatModeState::new(
            gateways.preferences.clone(),
            player_state.clone(),
        ));
        let shuffle_mode = Arc::new(ShuffleModeState::new(
            gateways.preferences.clone(),
            player_state.clone(),
        ));
        let queue = QueueImpl::new(
            gateways.tracks.clone(),
            gateways.playing_queue.clone(),
            gateways.preferences.clone(),
            repeat_mode.clone(),
            player_state,
            &tunables,
        );

        Self {
            queue,
            gateways,
            repeat_mode,
            shuffle_mode,
            enhanced_shuffle: EnhancedShuffle::new(tunables.shuffle_max_passes),
            tunables,
        }
    }

    #[must_use]
    pub fn queue(&self) -> &QueueImpl {
        &self.queue
    }

    #[must_use]
    pub fn repeat_mode(&self) -> &Arc<RepeatModeState> {
        &self.repeat_mode
    }

    #[must_use]
    pub fn shuffle_mode(&self) -> &Arc<ShuffleModeState> {
        &self.shuffle_mode
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Restores the persisted queue from the previous session.
    ///
    /// The queue is positioned on the stored `id_in_playlist` and not written
    /// back.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the stored queue cannot be read.
    pub async fn prepare(&self) -> Result<Option<PlayerMediaEntity>, QueueError> {
        let items = self.gateways.playing_queue.get_all().await?;
        let last_id = self.gateways.preferences.last_id_in_playlist();
        let index = items
            .iter()
            .position(|item| item.id_in_playlist == last_id)
            .unwrap_or(0);

        let Some(result) = items.get(index).cloned() else {
            debug!("QueueManager: nothing to restore");
            return Ok(None);
        };
        let position_in_queue = self.queue.compute_position_in_queue(items.len(), index);
        self.queue.update_state(items, index, true, false);

        let bookmark_ms = self.last_session_bookmark(&result).await;
        debug!(id = result.id, index, bookmark_ms, "QueueManager: queue restored");
        Ok(Some(PlayerMediaEntity {
            entity: result,
            position_in_queue,
            bookmark_ms,
        }))
    }

    /// Plays the category of `media_id`, starting at its track if it has one.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the category cannot be resolved.
    pub async fn handle_play_from_media_id(
        &self,
        media_id: &MediaId,
        filter: Option<&str>,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        debug!(%media_id, ?filter, "QueueManager: play from media id");
        let parent = media_id.parent_id();
        let songs = self.gateways.tracks.get_song_list_by_param(&parent).await?;
        let items = to_entities(
            songs
                .iter()
                .filter(|song| song_matches(&song.title, &song.artist, &song.album, filter)),
            &parent,
        );

        self.shuffle_mode.set_enabled(false);
        let index = self.start_index(&items, media_id.track_id());
        self.start_queue(items, index).await
    }

    /// Plays songs of the track's category added within the configured window.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the lookup fails.
    pub async fn handle_play_recently_added(
        &self,
        track: &MediaId,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        debug!(%track, "QueueManager: play recently added");
        let parent = track.parent_id();
        let songs = self
            .gateways
            .tracks
            .get_recently_added(&parent, self.tunables.recently_added_window)
            .await?;
        let items = to_entities(songs.iter(), &parent);

        self.shuffle_mode.set_enabled(false);
        let index = self.start_index(&items, track.track_id());
        self.start_queue(items, index).await
    }

    /// Plays the most played songs of the track's category.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the lookup fails.
    pub async fn handle_play_most_played(
        &self,
        track: &MediaId,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        debug!(%track, "QueueManager: play most played");
        let parent = track.parent_id();
        let songs = self
            .gateways
            .most_played
            .get_most_played(&parent, self.tunables.most_played_min_plays)
            .await?;
        let items = to_entities(songs.iter(), &parent);

        self.shuffle_mode.set_enabled(false);
        let index = self.start_index(&items, track.track_id());
        self.start_queue(items, index).await
    }

    /// Plays a category in enhanced-shuffle order and turns shuffle on.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the category cannot be resolved.
    pub async fn handle_play_shuffle(
        &self,
        category: &MediaId,
        filter: Option<&str>,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        debug!(%category, ?filter, "QueueManager: play shuffle");
        let songs = self.gateways.tracks.get_song_list_by_param(category).await?;
        let items = to_entities(
            songs
                .iter()
                .filter(|song| song_matches(&song.title, &song.artist, &song.album, filter)),
            category,
        );

        self.shuffle_mode.set_enabled(true);
        let items = self.enhanced_shuffle.shuffle(items);
        self.start_queue(items, 0).await
    }

    /// Plays the single library track stored at `uri`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the lookup fails.
    pub async fn handle_play_from_uri(
        &self,
        uri: &str,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        debug!(uri, "QueueManager: play from uri");
        let Some(song) = self.gateways.tracks.get_by_uri(uri).await? else {
            debug!(uri, "QueueManager: no track at uri");
            return Ok(None);
        };
        let item = MediaEntity::from_song(&song, 0, &song.parent_media_id());
        self.start_queue(vec![item], 0).await
    }

    /// Plays the 30 second preview of a Spotify track.
    ///
    /// The catalogue id is the part of the category id after the last `:`.
    ///
    /// # Errors
    ///
    /// Returns whatever the Spotify gateway reports.
    pub async fn handle_play_spotify_preview(
        &self,
        track: &MediaId,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        let uri = track.category_id();
        let track_id = uri.rsplit(':').next().unwrap_or(uri);
        debug!(track_id, "QueueManager: play spotify preview");

        let Some(remote) = self.gateways.spotify.get_track(track_id).await? else {
            return Ok(None);
        };
        let item = spotify_entity(&remote, track);
        self.start_queue(vec![item], 0).await
    }

    /// Plays the result of a voice query.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the songs cannot be resolved.
    pub async fn handle_play_from_voice_search(
        &self,
        query: &str,
        extras: &VoiceSearchExtras,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        let params = VoiceSearchParams::new(query, extras);
        debug!(focus = ?params.focus, "QueueManager: play from voice search");

        let mut songs: Vec<Song> = match &params.focus {
            SearchFocus::Genre(name) => self.gateways.genres.get_songs_by_genre_name(name).await?,
            _ => {
                self.gateways
                    .tracks
                    .get_song_list_by_param(&MediaId::songs_category())
                    .await?
            }
        };

        let force_shuffle = params.focus == SearchFocus::Any;
        if force_shuffle {
            songs.shuffle(&mut rand::rng());
        }
        let items = voice_search::filter(&songs, &params.focus);

        self.shuffle_mode.set_enabled(force_shuffle);
        self.start_queue(items, 0).await
    }

    /// Jumps to the queue item with `id_in_playlist`.
    pub async fn handle_skip_to_queue_item(
        &self,
        id_in_playlist: i64,
    ) -> Option<PlayerMediaEntity> {
        let entity = self.queue.get_song_by_id(id_in_playlist)?;
        Some(self.current_player_entity(entity).await)
    }

    pub async fn handle_skip_to_next(&self, track_ended: bool) -> Option<PlayerMediaEntity> {
        let entity = self.queue.get_next_song(track_ended)?;
        Some(self.current_player_entity(entity).await)
    }

    pub async fn handle_skip_to_previous(
        &self,
        player_bookmark_ms: i64,
    ) -> Option<PlayerMediaEntity> {
        let entity = self.queue.get_previous_song(player_bookmark_ms)?;
        Some(self.current_player_entity(entity).await)
    }

    pub async fn get_playing_song(&self) -> Option<PlayerMediaEntity> {
        let entity = self.queue.get_current_song()?;
        Some(self.current_player_entity(entity).await)
    }

    pub fn handle_swap(&self, from: usize, to: usize) {
        self.queue.handle_swap(from, to);
    }

    pub fn handle_swap_relative(&self, from: usize, to: usize) {
        self.queue.handle_swap_relative(from, to);
    }

    pub fn handle_move_relative(&self, position: usize) {
        self.queue.handle_move_relative(position);
    }

    pub fn handle_remove(&self, position: usize) {
        self.queue.handle_remove(position);
    }

    pub fn handle_remove_relative(&self, position: usize) {
        self.queue.handle_remove_relative(position);
    }

    pub fn sort(&self) {
        self.queue.sort();
    }

    pub fn shuffle(&self) {
        self.queue.shuffle();
    }

    pub fn on_repeat_mode_changed(&self) {
        self.queue.on_repeat_mode_changed();
    }

    #[must_use]
    pub fn current_position_in_queue(&self) -> PositionInQueue {
        self.queue.current_position_in_queue()
    }

    /// Queues songs right after the current item and returns the current
    /// item's new position.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if a song lookup fails.
    pub async fn play_next(&self, song_ids: &[i64]) -> Result<PositionInQueue, QueueError> {
        let before = self.current_position_in_queue();
        let inserted = self.queue.play_next(song_ids).await?;
        Ok(if inserted > 0 {
            before.after_insertion()
        } else {
            before
        })
    }

    /// Appends songs to the queue and returns the current item's new position.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if a song lookup fails.
    pub async fn play_later(&self, song_ids: &[i64]) -> Result<PositionInQueue, QueueError> {
        let before = self.current_position_in_queue();
        let inserted = self.queue.play_later(song_ids).await?;
        Ok(if inserted > 0 {
            before.after_insertion()
        } else {
            before
        })
    }

    /// Stores the playback offset of the current item if it is a podcast.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Library` if the position cannot be stored.
    pub async fn update_podcast_position(&self, position_ms: i64) -> Result<(), QueueError> {
        match self.queue.get_current_song() {
            Some(current) if current.is_podcast => {
                self.gateways
                    .podcast_positions
                    .set(current.id, position_ms)
                    .await?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Stores the music offset restored by the next [`prepare`](Self::prepare).
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Preferences` if the settings file cannot be written.
    pub fn save_bookmark(&self, position_ms: i64) -> Result<(), QueueError> {
        self.gateways.preferences.set_bookmark(position_ms)?;
        Ok(())
    }

    fn start_index(&self, items: &[MediaEntity], song_id: Option<i64>) -> usize {
        match song_id {
            Some(id) if !self.shuffle_mode.is_enabled() => {
                items.iter().position(|item| item.id == id).unwrap_or(0)
            }
            _ => 0,
        }
    }

    async fn start_queue(
        &self,
        items: Vec<MediaEntity>,
        index: usize,
    ) -> Result<Option<PlayerMediaEntity>, QueueError> {
        let Some(result) = items.get(index).cloned() else {
            debug!("QueueManager: resolved queue is empty");
            return Ok(None);
        };
        let position_in_queue = self.queue.compute_position_in_queue(items.len(), index);
        self.queue.update_state(items, index, false, true);

        let bookmark_ms = self.podcast_bookmark_or_default(&result).await;
        Ok(Some(PlayerMediaEntity {
            entity: result,
            position_in_queue,
            bookmark_ms,
        }))
    }

    async fn current_player_entity(&self, entity: MediaEntity) -> PlayerMediaEntity {
        let bookmark_ms = self.podcast_bookmark_or_default(&entity).await;
        PlayerMediaEntity {
            entity,
            position_in_queue: self.queue.current_position_in_queue(),
            bookmark_ms,
        }
    }

    async fn podcast_bookmark_or_default(&self, entity: &MediaEntity) -> i64 {
        if !entity.is_podcast {
            return 0;
        }
        let stored = self
            .gateways
            .podcast_positions
            .get(entity.id)
            .await
            .add_context("Failed to read podcast position");
        ErrorReporter::swallow(stored, "podcast bookmark")
            .map_or(0, |position| clamp_bookmark(position, entity.duration_ms))
    }

    async fn last_session_bookmark(&self, entity: &MediaEntity) -> i64 {
        if entity.is_podcast {
            self.podcast_bookmark_or_default(entity).await
        } else {
            clamp_bookmark(self.gateways.preferences.bookmark(), entity.duration_ms)
        }
    }
}

fn clamp_bookmark(position_ms: i64, duration_ms: i64) -> i64 {
    position_ms.clamp(0, duration_ms.max(0))
}

fn to_entities<'a>(songs: impl Iterator<Item = &'a Song>, parent: &MediaId) -> Vec<MediaEntity> {
    songs
        .zip(0..)
        .map(|(song, index)| MediaEntity::from_song(song, index, parent))
        .collect()
}

fn spotify_entity(track: &SpotifyTrack, media_id: &MediaId) -> MediaEntity {
    MediaEntity {
        id: stable_id(&track.id),
        id_in_playlist: 0,
        media_id: media_id.clone(),
        artist_id: -1,
        album_id: -1,
        title: track.name.clone(),
        artist: track.artist.clone(),
        album_artist: track.artist.clone(),
        album: track.album.clone(),
        duration_ms: SPOTIFY_PREVIEW_MS,
        path: track.preview_url.clone().unwrap_or_default(),
        track_number: track.track_number,
        disc_number: track.disc_number,
        is_podcast: false,
    }
}

/// FNV-1a over the catalogue id; the same id maps to the same song id across
/// runs and builds.
fn stable_id(id: &str) -> i64 {
    let hash = id.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    i64::from_ne_bytes(hash.to_ne_bytes())
}

#[cfg(test)]
mod tests {
    use crate::queue::queue_manager::{clamp_bookmark, stable_id};

    #[test]
    fn test_clamp_bookmark() {
        assert_eq!(clamp_bookmark(-5, 1000), 0);
        assert_eq!(clamp_bookmark(500, 1000), 500);
        assert_eq!(clamp_bookmark(5000, 1000), 1000);
        assert_eq!(clamp_bookmark(5000, -1), 0);
    }

    #[test]
    fn test_stable_id() {
        assert_eq!(stable_id("4uLU6hMCjMI75M1A2tKUQC"), stable_id("4uLU6hMCjMI75M1A2tKUQC"));
        assert_ne!(stable_id("a"), stable_id("b"));
    }
}
