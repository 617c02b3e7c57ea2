//! Side effects of the item the player is on.
//!
//! Every lifecycle callback becomes one [`Work`] item on a bounded channel.
//! A single task drains it, so plays, favorite lookups and metadata saves
//! for consecutive items are applied strictly in the order the player
//! reported them. Failures are logged and dropped.

use std::sync::Arc;

use {
    async_channel::{Receiver, Sender, bounded},
    async_trait::async_trait,
    parking_lot::Mutex,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, trace, warn},
};

use crate::{
    config::LastMetadata,
    error::{ErrorReporter, ResultExt, ServiceError},
    library::{
        FavoriteItemState, FavoriteState, FavoriteTrackType, LibraryDatabase, MediaIdCategory,
        gateway::{
            FavoriteGateway, HistoryGateway, LastPlayedGateway, MostPlayedGateway,
            MusicPreferencesGateway,
        },
    },
    queue::MediaEntity,
    service::{ListenerId, PlayerLifecycle, PlayerLifecycleListener},
    state::PlayerState,
};

/// Stores written to when the current item changes.
#[derive(Clone)]
pub struct CurrentSongGateways {
    pub most_played: Arc<dyn MostPlayedGateway>,
    pub history: Arc<dyn HistoryGateway>,
    pub last_played: Arc<dyn LastPlayedGateway>,
    pub favorites: Arc<dyn FavoriteGateway>,
    pub preferences: Arc<dyn MusicPreferencesGateway>,
}

impl CurrentSongGateways {
    #[must_use]
    pub fn from_database(
        database: &LibraryDatabase,
        preferences: Arc<dyn MusicPreferencesGateway>,
    ) -> Self {
        let database = Arc::new(database.clone());
        Self {
            most_played: database.clone(),
            history: database.clone(),
            last_played: database.clone(),
            favorites: database,
            preferences,
        }
    }
}

#[derive(Debug)]
enum Work {
    /// Restored item: refresh favorite and save metadata.
    Prepare(MediaEntity),
    /// Newly started item: additionally record the play.
    Started(MediaEntity),
}

struct CurrentSongListener {
    work: Sender<Work>,
}

impl CurrentSongListener {
    async fn submit(&self, work: Work) {
        if let Err(e) = self.work.send(work).await {
            debug!("CurrentSong: {}", ServiceError::from(e));
        }
    }
}

#[async_trait]
impl PlayerLifecycleListener for CurrentSongListener {
    async fn on_prepare(&self, entity: &MediaEntity) {
        self.submit(Work::Prepare(entity.clone())).await;
    }

    async fn on_metadata_changed(&self, entity: &MediaEntity) {
        self.submit(Work::Started(entity.clone())).await;
    }
}

/// Records plays and keeps favorite state and last metadata current.
pub struct CurrentSong {
    lifecycle: Arc<PlayerLifecycle>,
    listener_id: ListenerId,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CurrentSong {
    /// Attaches to `lifecycle` and starts the worker. Must be called from
    /// within a tokio runtime.
    #[must_use]
    pub fn start(
        gateways: CurrentSongGateways,
        player_state: PlayerState,
        lifecycle: Arc<PlayerLifecycle>,
        capacity: usize,
    ) -> Self {
        let (work_tx, work_rx) = bounded(capacity.max(1));
        let cancel = CancellationToken::new();
        let worker = Worker {
            gateways,
            player_state,
        };
        let task = tokio::spawn(worker.run(work_rx, cancel.clone()));
        let listener_id =
            lifecycle.add_listener(Arc::new(CurrentSongListener { work: work_tx }));

        Self {
            lifecycle,
            listener_id,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Detaches from the player and waits for queued work to finish.
    pub async fn stop(&self) {
        self.lifecycle.remove_listener(self.listener_id);
        let task = self.task.lock().take();
        // Dropping the last sender lets the worker drain and exit.
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!("CurrentSong: worker ended abnormally: {e}");
        }
    }
}

impl Drop for CurrentSong {
    fn drop(&mut self) {
        self.lifecycle.remove_listener(self.listener_id);
        self.cancel.cancel();
    }
}

struct Worker {
    gateways: CurrentSongGateways,
    player_state: PlayerState,
}

impl Worker {
    async fn run(self, work: Receiver<Work>, cancel: CancellationToken) {
        loop {
            let item = tokio::select! {
                () = cancel.cancelled() => break,
                item = work.recv() => match item {
                    Ok(item) => item,
                    Err(_) => break,
                },
            };
            trace!(?item, "CurrentSong: processing");
            match item {
                Work::Prepare(entity) => {
                    self.refresh_favorite(&entity).await;
                    self.save_last_metadata(&entity);
                }
                Work::Started(entity) => {
                    self.record_play(&entity).await;
                    self.refresh_favorite(&entity).await;
                    self.save_last_metadata(&entity);
                }
            }
        }
        debug!("CurrentSong: worker finished");
    }

    async fn record_play(&self, entity: &MediaEntity) {
        let parent = entity.media_id.parent_id();
        match parent.kind() {
            MediaIdCategory::Artists | MediaIdCategory::PodcastArtists => {
                let result = self
                    .gateways
                    .last_played
                    .insert_artist(&parent)
                    .await
                    .add_context("Failed to insert last played artist");
                ErrorReporter::swallow(result, "record play");
            }
            MediaIdCategory::Albums => {
                let result = self
                    .gateways
                    .last_played
                    .insert_album(&parent)
                    .await
                    .add_context("Failed to insert last played album");
                ErrorReporter::swallow(result, "record play");
            }
            _ => {}
        }

        let result = self
            .gateways
            .most_played
            .insert(&entity.media_id)
            .await
            .add_contextf(format_args!("Failed to insert most played {}", entity.media_id));
        ErrorReporter::swallow(result, "record play");

        let result = self
            .gateways
            .history
            .insert(entity.id, entity.is_podcast)
            .await
            .add_contextf(format_args!("Failed to insert history {}", entity.id));
        ErrorReporter::swallow(result, "record play");
    }

    async fn refresh_favorite(&self, entity: &MediaEntity) {
        let track_type = if entity.is_podcast {
            FavoriteTrackType::Podcast
        } else {
            FavoriteTrackType::Track
        };
        let result = self
            .gateways
            .favorites
            .is_favorite(entity.id, track_type)
            .await
            .add_context("Failed to read favorite state");
        let Some(is_favorite) = ErrorReporter::swallow(result, "refresh favorite") else {
            return;
        };

        let state = if is_favorite {
            FavoriteState::Favorite
        } else {
            FavoriteState::NotFavorite
        };
        self.player_state.update_favorite(FavoriteItemState {
            id: entity.id,
            state,
            track_type,
        });
    }

    fn save_last_metadata(&self, entity: &MediaEntity) {
        let result = self
            .gateways
            .preferences
            .set_last_metadata(LastMetadata {
                title: entity.title.clone(),
                subtitle: entity.artist.clone(),
                id: entity.id,
            })
            .add_context("Failed to save last metadata");
        ErrorReporter::swallow(result, "save last metadata");
    }
}
