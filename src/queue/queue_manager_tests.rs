//! Scenario tests for play intents and transport controls.
//!
//! These run the queue manager against the real SQLite store (in memory) and
//! a settings file in a temporary directory.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        async_trait::async_trait,
        tempfile::TempDir,
        tokio::time::{Duration, timeout},
    };

    use crate::{
        config::SettingsManager,
        error::QueueError,
        library::{
            LibraryDatabase, MediaId, MediaIdCategory, Song, SpotifyTrack,
            database::now_unix_seconds,
            gateway::{
                MostPlayedGateway, MusicPreferencesGateway, PlayingQueueGateway,
                PodcastPositionGateway, SpotifyGateway,
            },
        },
        queue::{
            FocusKind, PositionInQueue, QueueGateways, QueueManager, QueueTunables,
            VoiceSearchExtras,
        },
        state::{PlayerState, PlayerStateEvent},
    };

    // Default timeout in milliseconds for test async operations
    const TEST_TIMEOUT_MS: u64 = 1000;

    struct FakeSpotify;

    #[async_trait]
    impl SpotifyGateway for FakeSpotify {
        async fn get_track(&self, track_id: &str) -> Result<Option<SpotifyTrack>, QueueError> {
            Ok((track_id == "abc").then(|| SpotifyTrack {
                id: "abc".to_string(),
                name: "Preview".to_string(),
                artist: "Remote Artist".to_string(),
                album: "Remote Album".to_string(),
                disc_number: 1,
                track_number: 4,
                preview_url: Some("https://p.scdn.co/mp3-preview/abc".to_string()),
            }))
        }
    }

    struct Fixture {
        manager: QueueManager,
        db: LibraryDatabase,
        prefs: Arc<SettingsManager>,
        player_state: PlayerState,
        _dir: TempDir,
    }

    impl Fixture {
        fn manager(&self) -> QueueManager {
            QueueManager::new(
                QueueGateways::from_database(&self.db, self.prefs.clone(), Arc::new(FakeSpotify)),
                self.player_state.clone(),
                QueueTunables::default(),
            )
        }

        fn queue_ids(&self) -> Vec<i64> {
            self.manager
                .queue()
                .snapshot()
                .items
                .iter()
                .map(|item| item.id)
                .collect()
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn song(
        id: i64,
        artist_id: i64,
        album_id: i64,
        title: &str,
        artist: &str,
        album: &str,
        genre: &str,
        days_old: i64,
    ) -> Song {
        Song {
            id,
            artist_id,
            album_id,
            title: title.to_string(),
            artist: artist.to_string(),
            album_artist: artist.to_string(),
            album: album.to_string(),
            duration_ms: 200_000,
            date_added: now_unix_seconds() - days_old * 24 * 60 * 60,
            path: format!("/music/{id}.flac"),
            track_number: id,
            genre: Some(genre.to_string()),
            ..Song::default()
        }
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let prefs =
            Arc::new(SettingsManager::with_config_path(dir.path().join("settings.json")).unwrap());
        let db = LibraryDatabase::in_memory().await.unwrap();

        let library = [
            song(1, 1, 10, "So What", "Miles Davis", "Kind of Blue", "Jazz", 1),
            song(2, 1, 10, "Freddie Freeloader", "Miles Davis", "Kind of Blue", "Jazz", 1),
            song(3, 1, 10, "Blue in Green", "Miles Davis", "Kind of Blue", "Jazz", 1),
            song(4, 2, 20, "Giant Steps", "John Coltrane", "Giant Steps", "Bop", 1),
            song(5, 2, 20, "Naima", "John Coltrane", "Giant Steps", "Bop", 30),
        ];
        for s in &library {
            db.insert_song(s).await.unwrap();
        }
        db.insert_song(&Song {
            id: 50,
            artist_id: 3,
            album_id: 30,
            title: "Episode".to_string(),
            artist: "Host".to_string(),
            album: "Show".to_string(),
            duration_ms: 60_000,
            path: "/podcasts/50.mp3".to_string(),
            is_podcast: true,
            ..Song::default()
        })
        .await
        .unwrap();

        let player_state = PlayerState::new();
        let manager = QueueManager::new(
            QueueGateways::from_database(&db, prefs.clone(), Arc::new(FakeSpotify)),
            player_state.clone(),
            QueueTunables::default(),
        );
        Fixture {
            manager,
            db,
            prefs,
            player_state,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_play_from_media_id_starts_at_track() {
        let f = fixture().await;
        f.prefs.set_shuffle_enabled(true).unwrap();
        let manager = f.manager();
        assert!(manager.shuffle_mode().is_enabled());

        let track = MediaId::track(MediaIdCategory::Albums, "10", 2);
        let result = manager
            .handle_play_from_media_id(&track, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.entity.id, 2);
        assert_eq!(result.entity.media_id, track);
        assert_eq!(result.position_in_queue, PositionInQueue::InMiddle);
        assert_eq!(result.bookmark_ms, 0);
        assert!(!manager.shuffle_mode().is_enabled());
        let ids: Vec<i64> = manager.queue().snapshot().items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        manager.queue().flush().await;
        assert_eq!(f.db.get_all().await.unwrap().len(), 3);
        assert_eq!(f.prefs.last_id_in_playlist(), 1);
    }

    #[tokio::test]
    async fn test_missing_track_starts_at_first_item() {
        let f = fixture().await;
        let track = MediaId::track(MediaIdCategory::Albums, "10", 99);
        let result = f
            .manager
            .handle_play_from_media_id(&track, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.entity.id, 1);
        assert_eq!(result.position_in_queue, PositionInQueue::First);
    }

    #[tokio::test]
    async fn test_filter_narrows_queue() {
        let f = fixture().await;
        let result = f
            .manager
            .handle_play_from_media_id(&MediaId::songs_category(), Some("NAIMA"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.entity.id, 5);
        assert_eq!(result.position_in_queue, PositionInQueue::FirstAndLast);
        assert_eq!(f.queue_ids(), vec![5]);
    }

    #[tokio::test]
    async fn test_empty_category_returns_none() {
        let f = fixture().await;
        let playlist = MediaId::category(MediaIdCategory::Playlists, "7");
        assert!(
            f.manager
                .handle_play_from_media_id(&playlist, None)
                .await
                .unwrap()
                .is_none()
        );
        assert!(f.manager.is_empty());
    }

    #[tokio::test]
    async fn test_play_shuffle_enables_shuffle() {
        let f = fixture().await;
        let result = f
            .manager
            .handle_play_shuffle(&MediaId::songs_category(), None)
            .await
            .unwrap()
            .unwrap();

        assert!(f.manager.shuffle_mode().is_enabled());
        assert_eq!(result.position_in_queue, PositionInQueue::First);

        let mut ids = f.queue_ids();
        assert_eq!(ids[0], result.entity.id);
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_recently_added_window() {
        let f = fixture().await;
        let track = MediaId::track(MediaIdCategory::Albums, "20", 4);
        let result = f
            .manager
            .handle_play_recently_added(&track)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.entity.id, 4);
        assert_eq!(result.position_in_queue, PositionInQueue::FirstAndLast);
        assert_eq!(f.queue_ids(), vec![4]);
    }

    #[tokio::test]
    async fn test_most_played_threshold() {
        let f = fixture().await;
        let album = |id| MediaId::track(MediaIdCategory::Albums, "10", id);
        for (id, plays) in [(1, 6), (2, 2), (3, 5)] {
            for _ in 0..plays {
                MostPlayedGateway::insert(&f.db, &album(id)).await.unwrap();
            }
        }

        let result = f
            .manager
            .handle_play_most_played(&album(3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(f.queue_ids(), vec![1, 3]);
        assert_eq!(result.entity.id, 3);
        assert_eq!(result.position_in_queue, PositionInQueue::Last);
    }

    #[tokio::test]
    async fn test_podcast_bookmark_is_clamped() {
        let f = fixture().await;
        PodcastPositionGateway::set(&f.db, 50, 999_999).await.unwrap();

        let episode = MediaId::track(MediaIdCategory::Podcasts, "", 50);
        let result = f
            .manager
            .handle_play_from_media_id(&episode, None)
            .await
            .unwrap()
            .unwrap();

        assert!(result.entity.is_podcast);
        assert_eq!(result.bookmark_ms, 60_000);

        f.manager.update_podcast_position(1_234).await.unwrap();
        assert_eq!(PodcastPositionGateway::get(&f.db, 50).await.unwrap(), 1_234);
    }

    #[tokio::test]
    async fn test_prepare_restores_previous_session() {
        let f = fixture().await;
        let track = MediaId::track(MediaIdCategory::Albums, "10", 3);
        f.manager
            .handle_play_from_media_id(&track, None)
            .await
            .unwrap();
        f.manager.queue().flush().await;
        f.manager.save_bookmark(500_000).unwrap();

        let restored = f.manager();
        let result = restored.prepare().await.unwrap().unwrap();

        assert_eq!(result.entity.id, 3);
        assert_eq!(result.position_in_queue, PositionInQueue::Last);
        assert_eq!(result.bookmark_ms, 200_000);
        assert_eq!(restored.queue().snapshot().items.len(), 3);
    }

    #[tokio::test]
    async fn test_prepare_without_saved_queue() {
        let f = fixture().await;
        assert!(f.manager.prepare().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_play_next_and_later_positions() {
        let f = fixture().await;
        let result = f
            .manager
            .handle_play_from_uri("file:///music/4.flac")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.position_in_queue, PositionInQueue::FirstAndLast);

        assert_eq!(
            f.manager.play_next(&[1]).await.unwrap(),
            PositionInQueue::First
        );
        f.manager.queue().flush().await;
        assert_eq!(
            f.manager.play_later(&[99]).await.unwrap(),
            PositionInQueue::First
        );
        assert_eq!(f.queue_ids(), vec![4, 1]);

        let next = f.manager.handle_skip_to_next(false).await.unwrap();
        assert_eq!(next.entity.id, 1);
        assert_eq!(next.position_in_queue, PositionInQueue::Last);
    }

    #[tokio::test]
    async fn test_unknown_uri_returns_none() {
        let f = fixture().await;
        assert!(
            f.manager
                .handle_play_from_uri("file:///missing.flac")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_transport_controls() {
        let f = fixture().await;
        f.manager
            .handle_play_from_media_id(&MediaId::category(MediaIdCategory::Albums, "10"), None)
            .await
            .unwrap();

        let next = f.manager.handle_skip_to_next(false).await.unwrap();
        assert_eq!(next.entity.id, 2);
        assert_eq!(next.position_in_queue, PositionInQueue::InMiddle);

        let jumped = f.manager.handle_skip_to_queue_item(2).await.unwrap();
        assert_eq!(jumped.entity.id, 3);
        assert_eq!(jumped.position_in_queue, PositionInQueue::Last);

        let restarted = f.manager.handle_skip_to_previous(20_000).await.unwrap();
        assert_eq!(restarted.entity.id, 3);

        let previous = f.manager.handle_skip_to_previous(0).await.unwrap();
        assert_eq!(previous.entity.id, 2);
        assert_eq!(f.manager.get_playing_song().await.unwrap().entity.id, 2);
    }

    #[tokio::test]
    async fn test_voice_search_focus() {
        let f = fixture().await;

        f.manager
            .handle_play_from_voice_search("", &VoiceSearchExtras::default())
            .await
            .unwrap()
            .unwrap();
        assert!(f.manager.shuffle_mode().is_enabled());
        assert_eq!(f.queue_ids().len(), 5);

        let artist = VoiceSearchExtras {
            focus: Some(FocusKind::Artist),
            artist: Some("john coltrane".to_string()),
            ..VoiceSearchExtras::default()
        };
        f.manager
            .handle_play_from_voice_search("coltrane", &artist)
            .await
            .unwrap()
            .unwrap();
        assert!(!f.manager.shuffle_mode().is_enabled());
        assert_eq!(f.queue_ids(), vec![4, 5]);

        let genre = VoiceSearchExtras {
            focus: Some(FocusKind::Genre),
            genre: Some("Jazz".to_string()),
            ..VoiceSearchExtras::default()
        };
        f.manager
            .handle_play_from_voice_search("jazz", &genre)
            .await
            .unwrap()
            .unwrap();
        let mut ids = f.queue_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_spotify_preview() {
        let f = fixture().await;
        let preview = MediaId::track(MediaIdCategory::SpotifyTracks, "spotify:track:abc", 0);
        let result = f
            .manager
            .handle_play_spotify_preview(&preview)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.entity.title, "Preview");
        assert_eq!(result.entity.duration_ms, 30_000);
        assert_eq!(result.entity.media_id, preview);

        let again = f
            .manager
            .handle_play_spotify_preview(&preview)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.entity.id, result.entity.id);

        let unknown = MediaId::track(MediaIdCategory::SpotifyTracks, "spotify:track:zzz", 0);
        assert!(
            f.manager
                .handle_play_spotify_preview(&unknown)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_new_queue_is_broadcast() {
        let f = fixture().await;
        let mut rx = f.player_state.subscribe();

        f.manager
            .handle_play_from_media_id(&MediaId::category(MediaIdCategory::Albums, "20"), None)
            .await
            .unwrap();

        let event = timeout(Duration::from_millis(TEST_TIMEOUT_MS), async {
            loop {
                if let Ok(PlayerStateEvent::QueueChanged(queue)) = rx.recv().await {
                    return queue;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(event.items.len(), 2);
        assert_eq!(event.current_index, Some(0));
    }

    #[tokio::test]
    async fn test_skip_before_deferred_broadcast_keeps_player_state_in_step() {
        let f = fixture().await;
        f.manager
            .handle_play_from_media_id(&MediaId::track(MediaIdCategory::Albums, "10", 1), None)
            .await
            .unwrap();

        let next = f.manager.handle_skip_to_next(false).await.unwrap();
        f.manager.queue().flush().await;

        assert_eq!(next.entity.id, 2);
        let owned = f.manager.queue().snapshot();
        let published = f.player_state.get_queue();
        assert_eq!(owned.current_index, Some(1));
        assert_eq!(published.current_index, owned.current_index);
        assert_eq!(published.items, owned.items);
    }

    #[tokio::test]
    async fn test_play_next_on_empty_queue_keeps_position() {
        let f = fixture().await;

        let position = f.manager.play_next(&[1, 2]).await.unwrap();
        assert_eq!(position, PositionInQueue::FirstAndLast);
        assert!(f.manager.is_empty());
    }
}
