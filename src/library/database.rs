//! Engine store using sqlx with SQLite.
//!
//! `LibraryDatabase` implements every storage-backed gateway: track and
//! genre lookups, the persisted queue, podcast positions, favorites, history,
//! play counts and last-played categories.

use std::{
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    sqlx::{Row, SqlitePool, sqlite::SqliteRow},
    tracing::debug,
};

use crate::{
    error::LibraryError,
    library::{
        gateway::{
            FavoriteGateway, GenreGateway, HistoryGateway, LastPlayedGateway, MostPlayedGateway,
            PlayingQueueGateway, PodcastPositionGateway, TrackGateway,
        },
        models::{FavoriteTrackType, MediaId, MediaIdCategory, Song},
        schema::{SchemaManager, create_connection_pool, create_memory_pool},
    },
    queue::MediaEntity,
};

const SONG_COLUMNS: &str = "s.id, s.artist_id, s.album_id, s.title, s.artist, s.album_artist, \
     s.album, s.duration_ms, s.date_added, s.path, s.track_number, s.disc_number, s.is_podcast, \
     s.genre";

/// Most-played lists are capped like a chart.
const MOST_PLAYED_LIMIT: i64 = 10;

/// Main store interface.
#[derive(Debug, Clone)]
pub struct LibraryDatabase {
    pool: SqlitePool,
}

impl LibraryDatabase {
    /// Opens (or creates) the store at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the database cannot be opened or initialized.
    pub async fn open(path: &Path) -> Result<Self, LibraryError> {
        let pool = create_connection_pool(path).await?;
        Self::with_pool(pool).await
    }

    /// Creates a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the schema cannot be created.
    pub async fn in_memory() -> Result<Self, LibraryError> {
        let pool = create_memory_pool().await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, LibraryError> {
        SchemaManager::new(pool.clone()).initialize_schema().await?;
        Ok(Self { pool })
    }

    /// Inserts or replaces a library row.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the write fails.
    pub async fn insert_song(&self, song: &Song) -> Result<(), LibraryError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO songs (id, artist_id, album_id, title, artist, album_artist,
                album, duration_ms, date_added, path, track_number, disc_number, is_podcast, genre)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(song.id)
        .bind(song.artist_id)
        .bind(song.album_id)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album_artist)
        .bind(&song.album)
        .bind(song.duration_ms)
        .bind(song.date_added)
        .bind(&song.path)
        .bind(song.track_number)
        .bind(song.disc_number)
        .bind(song.is_podcast)
        .bind(&song.genre)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Appends a song to a playlist.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the write fails.
    pub async fn add_to_playlist(
        &self,
        playlist_id: i64,
        song_id: i64,
    ) -> Result<(), LibraryError> {
        sqlx::query(
            r#"
            INSERT INTO playlist_tracks (playlist_id, song_id, position)
            VALUES (?, ?, (
                SELECT COALESCE(MAX(position), -1) + 1 FROM playlist_tracks WHERE playlist_id = ?
            ))
            "#,
        )
        .bind(playlist_id)
        .bind(song_id)
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marks or unmarks a favorite.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the write fails.
    pub async fn set_favorite(
        &self,
        id: i64,
        track_type: FavoriteTrackType,
        favorite: bool,
    ) -> Result<(), LibraryError> {
        let query = if favorite {
            "INSERT OR IGNORE INTO favorites (id, track_type) VALUES (?, ?)"
        } else {
            "DELETE FROM favorites WHERE id = ? AND track_type = ?"
        };
        sqlx::query(query)
            .bind(id)
            .bind(favorite_type_tag(track_type))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Song ids of the play history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the query fails.
    pub async fn history(&self) -> Result<Vec<i64>, LibraryError> {
        let ids = sqlx::query_scalar("SELECT song_id FROM history ORDER BY row_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Category ids of a last-played kind, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the query fails.
    pub async fn last_played(&self, kind: MediaIdCategory) -> Result<Vec<String>, LibraryError> {
        let ids = sqlx::query_scalar(
            "SELECT category_id FROM last_played WHERE kind = ? ORDER BY seq DESC",
        )
        .bind(kind.tag())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn fetch_songs(&self, sql: &str, bind: Option<&str>) -> Result<Vec<Song>, LibraryError> {
        let query = sqlx::query_as::<_, Song>(sql);
        let query = match bind {
            Some(value) => query.bind(value.to_string()),
            None => query,
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn last_played_insert(
        &self,
        kind: MediaIdCategory,
        category_id: &str,
    ) -> Result<(), LibraryError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO last_played (kind, category_id, seq)
            VALUES (?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM last_played))
            "#,
        )
        .bind(kind.tag())
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Gets the database connection pool for advanced operations.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn favorite_type_tag(track_type: FavoriteTrackType) -> &'static str {
    match track_type {
        FavoriteTrackType::Track => "TRACK",
        FavoriteTrackType::Podcast => "PODCAST",
    }
}

fn parse_numeric_id(category: &MediaId) -> Result<i64, LibraryError> {
    category
        .category_id()
        .parse::<i64>()
        .map_err(|_| LibraryError::InvalidData {
            reason: format!("expected numeric category id in {category}"),
        })
}

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn media_entity_from_row(row: &SqliteRow) -> Result<MediaEntity, LibraryError> {
    let media_id: String = row.try_get("media_id")?;
    Ok(MediaEntity {
        id: row.try_get("song_id")?,
        id_in_playlist: row.try_get("id_in_playlist")?,
        media_id: media_id.parse()?,
        artist_id: row.try_get("artist_id")?,
        album_id: row.try_get("album_id")?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        album_artist: row.try_get("album_artist")?,
        album: row.try_get("album")?,
        duration_ms: row.try_get("duration_ms")?,
        path: row.try_get("path")?,
        track_number: row.try_get("track_number")?,
        disc_number: row.try_get("disc_number")?,
        is_podcast: row.try_get("is_podcast")?,
    })
}

#[async_trait]
impl TrackGateway for LibraryDatabase {
    async fn get_song_list_by_param(&self, category: &MediaId) -> Result<Vec<Song>, LibraryError> {
        let category = category.parent_id();
        debug!(category = %category, "Resolving song list");

        match category.kind() {
            MediaIdCategory::Songs => {
                self.fetch_songs(
                    &format!(
                        "SELECT {SONG_COLUMNS} FROM songs s WHERE s.is_podcast = 0 \
                         ORDER BY s.title COLLATE NOCASE"
                    ),
                    None,
                )
                .await
            }
            MediaIdCategory::Podcasts => {
                self.fetch_songs(
                    &format!(
                        "SELECT {SONG_COLUMNS} FROM songs s WHERE s.is_podcast = 1 \
                         ORDER BY s.title COLLATE NOCASE"
                    ),
                    None,
                )
                .await
            }
            MediaIdCategory::Albums | MediaIdCategory::PodcastAlbums => {
                let album_id = parse_numeric_id(&category)?;
                let songs = sqlx::query_as::<_, Song>(&format!(
                    "SELECT {SONG_COLUMNS} FROM songs s WHERE s.album_id = ? \
                     ORDER BY s.disc_number, s.track_number, s.title"
                ))
                .bind(album_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(songs)
            }
            MediaIdCategory::Artists | MediaIdCategory::PodcastArtists => {
                let artist_id = parse_numeric_id(&category)?;
                let songs = sqlx::query_as::<_, Song>(&format!(
                    "SELECT {SONG_COLUMNS} FROM songs s WHERE s.artist_id = ? \
                     ORDER BY s.album COLLATE NOCASE, s.disc_number, s.track_number"
                ))
                .bind(artist_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(songs)
            }
            MediaIdCategory::Genres => self.get_songs_by_genre_name(category.category_id()).await,
            MediaIdCategory::Folders => {
                let prefix = format!("{}/%", category.category_id().trim_end_matches('/'));
                self.fetch_songs(
                    &format!(
                        "SELECT {SONG_COLUMNS} FROM songs s WHERE s.path LIKE ? ORDER BY s.path"
                    ),
                    Some(&prefix),
                )
                .await
            }
            MediaIdCategory::Playlists | MediaIdCategory::PodcastPlaylists => {
                let playlist_id = parse_numeric_id(&category)?;
                let songs = sqlx::query_as::<_, Song>(&format!(
                    "SELECT {SONG_COLUMNS} FROM playlist_tracks p JOIN songs s ON s.id = p.song_id \
                     WHERE p.playlist_id = ? ORDER BY p.position"
                ))
                .bind(playlist_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(songs)
            }
            MediaIdCategory::SpotifyTracks => Ok(Vec::new()),
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Song>, LibraryError> {
        let song = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs s WHERE s.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(song)
    }

    async fn get_by_uri(&self, uri: &str) -> Result<Option<Song>, LibraryError> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        let song = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs s WHERE s.path = ?"
        ))
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(song)
    }

    async fn get_recently_added(
        &self,
        category: &MediaId,
        window: Duration,
    ) -> Result<Vec<Song>, LibraryError> {
        let window_secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
        let threshold = now_unix_seconds().saturating_sub(window_secs);

        let mut songs: Vec<Song> = self
            .get_song_list_by_param(category)
            .await?
            .into_iter()
            .filter(|s| s.date_added >= threshold)
            .collect();
        songs.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(songs)
    }
}

#[async_trait]
impl GenreGateway for LibraryDatabase {
    async fn get_songs_by_genre_name(&self, name: &str) -> Result<Vec<Song>, LibraryError> {
        self.fetch_songs(
            &format!(
                "SELECT {SONG_COLUMNS} FROM songs s WHERE s.genre = ? COLLATE NOCASE \
                 ORDER BY s.artist COLLATE NOCASE, s.album COLLATE NOCASE, s.track_number"
            ),
            Some(name),
        )
        .await
    }
}

#[async_trait]
impl PlayingQueueGateway for LibraryDatabase {
    async fn get_all(&self) -> Result<Vec<MediaEntity>, LibraryError> {
        let rows = sqlx::query("SELECT * FROM playing_queue ORDER BY position")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(media_entity_from_row).collect()
    }

    async fn update(&self, items: &[MediaEntity]) -> Result<(), LibraryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM playing_queue")
            .execute(&mut *tx)
            .await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO playing_queue (position, song_id, id_in_playlist, media_id, artist_id,
                    album_id, title, artist, album_artist, album, duration_ms, path, track_number,
                    disc_number, is_podcast)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .bind(item.id)
            .bind(item.id_in_playlist)
            .bind(item.media_id.to_string())
            .bind(item.artist_id)
            .bind(item.album_id)
            .bind(&item.title)
            .bind(&item.artist)
            .bind(&item.album_artist)
            .bind(&item.album)
            .bind(item.duration_ms)
            .bind(&item.path)
            .bind(item.track_number)
            .bind(item.disc_number)
            .bind(item.is_podcast)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(len = items.len(), "Persisted playing queue");
        Ok(())
    }
}

#[async_trait]
impl PodcastPositionGateway for LibraryDatabase {
    async fn get(&self, id: i64) -> Result<i64, LibraryError> {
        let position: Option<i64> =
            sqlx::query_scalar("SELECT position_ms FROM podcast_positions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(position.unwrap_or(0))
    }

    async fn set(&self, id: i64, position_ms: i64) -> Result<(), LibraryError> {
        sqlx::query("INSERT OR REPLACE INTO podcast_positions (id, position_ms) VALUES (?, ?)")
            .bind(id)
            .bind(position_ms)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FavoriteGateway for LibraryDatabase {
    async fn is_favorite(
        &self,
        id: i64,
        track_type: FavoriteTrackType,
    ) -> Result<bool, LibraryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM favorites WHERE id = ? AND track_type = ?")
                .bind(id)
                .bind(favorite_type_tag(track_type))
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl MostPlayedGateway for LibraryDatabase {
    async fn insert(&self, track: &MediaId) -> Result<(), LibraryError> {
        let Some(song_id) = track.track_id() else {
            return Err(LibraryError::InvalidData {
                reason: format!("most played needs a track id, got {track}"),
            });
        };
        sqlx::query("INSERT INTO most_played (song_id, category, category_id) VALUES (?, ?, ?)")
            .bind(song_id)
            .bind(track.kind().tag())
            .bind(track.category_id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_most_played(
        &self,
        category: &MediaId,
        min_plays: u32,
    ) -> Result<Vec<Song>, LibraryError> {
        let songs = sqlx::query_as::<_, Song>(&format!(
            r#"
            SELECT {SONG_COLUMNS}
            FROM songs s
            JOIN (
                SELECT song_id, COUNT(*) AS times_played
                FROM most_played
                WHERE category = ? AND category_id = ?
                GROUP BY song_id
                HAVING COUNT(*) >= ?
            ) m ON s.id = m.song_id
            ORDER BY m.times_played DESC, s.title COLLATE NOCASE
            LIMIT ?
            "#
        ))
        .bind(category.kind().tag())
        .bind(category.category_id())
        .bind(i64::from(min_plays))
        .bind(MOST_PLAYED_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(songs)
    }
}

#[async_trait]
impl HistoryGateway for LibraryDatabase {
    async fn insert(&self, id: i64, is_podcast: bool) -> Result<(), LibraryError> {
        sqlx::query("INSERT INTO history (song_id, is_podcast) VALUES (?, ?)")
            .bind(id)
            .bind(is_podcast)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LastPlayedGateway for LibraryDatabase {
    async fn insert_artist(&self, category: &MediaId) -> Result<(), LibraryError> {
        self.last_played_insert(category.kind(), category.category_id())
            .await
    }

    async fn insert_album(&self, category: &MediaId) -> Result<(), LibraryError> {
        self.last_played_insert(category.kind(), category.category_id())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        error::LibraryError,
        library::{
            database::{LibraryDatabase, now_unix_seconds},
            gateway::{
                FavoriteGateway, GenreGateway, HistoryGateway, LastPlayedGateway,
                MostPlayedGateway, PlayingQueueGateway, PodcastPositionGateway, TrackGateway,
            },
            models::{FavoriteTrackType, MediaId, MediaIdCategory, Song},
        },
        queue::MediaEntity,
    };

    fn song(id: i64, album_id: i64, title: &str) -> Song {
        Song {
            id,
            artist_id: 1,
            album_id,
            title: title.to_string(),
            artist: "Artist".to_string(),
            album_artist: "Artist".to_string(),
            album: format!("Album {album_id}"),
            duration_ms: 200_000,
            date_added: now_unix_seconds(),
            path: format!("/music/{album_id}/{id}.flac"),
            track_number: id,
            ..Song::default()
        }
    }

    async fn seeded() -> LibraryDatabase {
        let db = LibraryDatabase::in_memory().await.unwrap();
        db.insert_song(&song(1, 10, "Charlie")).await.unwrap();
        db.insert_song(&song(2, 10, "alpha")).await.unwrap();
        db.insert_song(&song(3, 20, "Bravo")).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_song_list_by_category() {
        let db = seeded().await;

        let all = db
            .get_song_list_by_param(&MediaId::songs_category())
            .await
            .unwrap();
        let titles: Vec<_> = all.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["alpha", "Bravo", "Charlie"]);

        let album = db
            .get_song_list_by_param(&MediaId::track(MediaIdCategory::Albums, "10", 2))
            .await
            .unwrap();
        assert_eq!(album.iter().map(|s| s.id).collect::<Vec<_>>(), [1, 2]);

        let folder = db
            .get_song_list_by_param(&MediaId::category(MediaIdCategory::Folders, "/music/20"))
            .await
            .unwrap();
        assert_eq!(folder.len(), 1);
        assert_eq!(folder[0].id, 3);
    }

    #[tokio::test]
    async fn test_non_numeric_album_id_is_invalid() {
        let db = seeded().await;
        let result = db
            .get_song_list_by_param(&MediaId::category(MediaIdCategory::Albums, "x"))
            .await;
        assert!(matches!(result, Err(LibraryError::InvalidData { .. })));
    }

    #[tokio::test]
    async fn test_playlist_keeps_insertion_order() {
        let db = seeded().await;
        db.add_to_playlist(5, 3).await.unwrap();
        db.add_to_playlist(5, 1).await.unwrap();

        let songs = db
            .get_song_list_by_param(&MediaId::category(MediaIdCategory::Playlists, "5"))
            .await
            .unwrap();
        assert_eq!(songs.iter().map(|s| s.id).collect::<Vec<_>>(), [3, 1]);
    }

    #[tokio::test]
    async fn test_lookup_by_uri_and_genre() {
        let db = seeded().await;
        db.insert_song(&Song {
            genre: Some("Jazz".to_string()),
            ..song(4, 30, "Delta")
        })
        .await
        .unwrap();

        let by_uri = db.get_by_uri("file:///music/30/4.flac").await.unwrap();
        assert_eq!(by_uri.map(|s| s.id), Some(4));
        assert!(db.get_by_uri("/missing.flac").await.unwrap().is_none());

        let jazz = db.get_songs_by_genre_name("jazz").await.unwrap();
        assert_eq!(jazz.len(), 1);
    }

    #[tokio::test]
    async fn test_recently_added_window() {
        let db = seeded().await;
        db.insert_song(&Song {
            date_added: now_unix_seconds() - 60 * 60 * 24 * 30,
            ..song(5, 10, "Old")
        })
        .await
        .unwrap();

        let recent = db
            .get_recently_added(&MediaId::songs_category(), Duration::from_secs(60 * 60 * 24 * 14))
            .await
            .unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.iter().all(|s| s.id != 5));
    }

    #[tokio::test]
    async fn test_playing_queue_replaces_previous_content() {
        let db = seeded().await;
        let parent = MediaId::category(MediaIdCategory::Albums, "10");
        let first: Vec<MediaEntity> = db
            .get_song_list_by_param(&parent)
            .await
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, s)| MediaEntity::from_song(s, i64::try_from(i).unwrap(), &parent))
            .collect();

        db.update(&first).await.unwrap();
        db.update(&first[..1]).await.unwrap();

        let stored = db.get_all().await.unwrap();
        assert_eq!(stored, first[..1].to_vec());
    }

    #[tokio::test]
    async fn test_most_played_threshold_and_order() {
        let db = seeded().await;
        let category = MediaId::category(MediaIdCategory::Albums, "10");
        for _ in 0..6 {
            MostPlayedGateway::insert(&db, &MediaId::track(MediaIdCategory::Albums, "10", 2))
                .await
                .unwrap();
        }
        for _ in 0..5 {
            MostPlayedGateway::insert(&db, &MediaId::track(MediaIdCategory::Albums, "10", 1))
                .await
                .unwrap();
        }
        for _ in 0..4 {
            MostPlayedGateway::insert(&db, &MediaId::track(MediaIdCategory::Albums, "20", 3))
                .await
                .unwrap();
        }

        let most_played = db.get_most_played(&category, 5).await.unwrap();
        assert_eq!(most_played.iter().map(|s| s.id).collect::<Vec<_>>(), [2, 1]);

        let other = MediaId::category(MediaIdCategory::Albums, "20");
        assert!(db.get_most_played(&other, 5).await.unwrap().is_empty());
        assert!(MostPlayedGateway::insert(&db, &category).await.is_err());
    }

    #[tokio::test]
    async fn test_side_effect_tables() {
        let db = seeded().await;

        assert_eq!(PodcastPositionGateway::get(&db, 9).await.unwrap(), 0);
        PodcastPositionGateway::set(&db, 9, 1234).await.unwrap();
        assert_eq!(PodcastPositionGateway::get(&db, 9).await.unwrap(), 1234);

        assert!(!db.is_favorite(1, FavoriteTrackType::Track).await.unwrap());
        db.set_favorite(1, FavoriteTrackType::Track, true).await.unwrap();
        assert!(db.is_favorite(1, FavoriteTrackType::Track).await.unwrap());
        assert!(!db.is_favorite(1, FavoriteTrackType::Podcast).await.unwrap());

        HistoryGateway::insert(&db, 1, false).await.unwrap();
        HistoryGateway::insert(&db, 3, false).await.unwrap();
        assert_eq!(db.history().await.unwrap(), [1, 3]);

        db.insert_album(&MediaId::category(MediaIdCategory::Albums, "10"))
            .await
            .unwrap();
        db.insert_album(&MediaId::category(MediaIdCategory::Albums, "20"))
            .await
            .unwrap();
        db.insert_album(&MediaId::category(MediaIdCategory::Albums, "10"))
            .await
            .unwrap();
        assert_eq!(
            db.last_played(MediaIdCategory::Albums).await.unwrap(),
            ["10", "20"]
        );
    }
}
