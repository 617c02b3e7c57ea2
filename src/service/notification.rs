//! Media notification and foreground gating.
//!
//! Player lifecycle callbacks and favorite changes become [`Event`]s on a
//! bounded channel drained by one consumer task. The consumer drops events
//! that change nothing, applies the rest to the live
//! [`MusicNotificationState`], renders an immutable snapshot and then moves
//! the host in or out of the foreground.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    async_channel::{Receiver, Sender, bounded},
    async_trait::async_trait,
    parking_lot::{Mutex, RwLock},
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    error::ServiceError,
    library::FavoriteState,
    queue::MediaEntity,
    service::{ListenerId, PlaybackStatus, PlayerLifecycle, PlayerLifecycleListener},
    state::{PlayerState, PlayerStateEvent},
};

/// Identifier the notification is posted under.
pub const NOTIFICATION_ID: u32 = 0x0D06;

/// Everything the notification shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicNotificationState {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub is_podcast: bool,
    pub duration_ms: i64,
    pub bookmark_ms: i64,
    pub is_playing: bool,
    pub is_favorite: bool,
}

impl Default for MusicNotificationState {
    fn default() -> Self {
        Self {
            id: -1,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            is_podcast: false,
            duration_ms: 0,
            bookmark_ms: 0,
            is_playing: false,
            is_favorite: false,
        }
    }
}

impl MusicNotificationState {
    /// Whether metadata has been received yet.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        self.id != -1
    }

    #[must_use]
    pub fn is_different_metadata(&self, entity: &MediaEntity) -> bool {
        self.id != entity.id
            || self.title != entity.title
            || self.artist != entity.artist
            || self.album != entity.album
            || self.is_podcast != entity.is_podcast
            || self.duration_ms != entity.duration_ms
    }

    /// Only the playing flag counts; position updates alone are ignored.
    #[must_use]
    pub fn is_different_state(&self, status: &PlaybackStatus) -> bool {
        self.is_playing != status.is_playing()
    }

    #[must_use]
    pub fn is_different_favorite(&self, is_favorite: bool) -> bool {
        self.is_favorite != is_favorite
    }

    /// Applies new metadata. A different item starts out as not favorite
    /// until its own favorite state arrives.
    pub fn update_metadata(&mut self, entity: &MediaEntity) -> bool {
        if !self.is_different_metadata(entity) {
            return false;
        }
        if self.id != entity.id {
            self.is_favorite = false;
        }
        self.id = entity.id;
        self.title.clone_from(&entity.title);
        self.artist.clone_from(&entity.artist);
        self.album.clone_from(&entity.album);
        self.is_podcast = entity.is_podcast;
        self.duration_ms = entity.duration_ms;
        true
    }

    pub fn update_state(&mut self, status: &PlaybackStatus) -> bool {
        if !self.is_different_state(status) {
            return false;
        }
        self.is_playing = status.is_playing();
        self.bookmark_ms = status.position_ms;
        true
    }

    pub fn update_favorite(&mut self, is_favorite: bool) -> bool {
        if !self.is_different_favorite(is_favorite) {
            return false;
        }
        self.is_favorite = is_favorite;
        true
    }
}

/// Rendered notification handed to the foreground host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub text: String,
    pub sub_text: String,
    /// Whether the user may swipe it away.
    pub dismissible: bool,
    pub is_favorite: bool,
}

impl Notification {
    /// Default rendering of `state`.
    #[must_use]
    pub fn from_state(state: &MusicNotificationState) -> Self {
        Self {
            id: NOTIFICATION_ID,
            title: state.title.clone(),
            text: state.artist.clone(),
            sub_text: state.album.clone(),
            dismissible: !state.is_playing,
            is_favorite: state.is_favorite,
        }
    }
}

/// Turns state snapshots into platform notifications.
pub trait NotificationRenderer: Send + Sync {
    fn update(&self, state: &MusicNotificationState) -> Notification;

    fn cancel(&self);
}

/// Process that can be promoted to foreground while music plays.
pub trait ForegroundHost: Send + Sync {
    fn start_foreground(&self, id: u32, notification: &Notification);

    /// Leaves the foreground, optionally removing the notification.
    fn stop_foreground(&self, remove_notification: bool);
}

/// Work items for the notification consumer.
#[derive(Debug, Clone)]
pub enum Event {
    Metadata(MediaEntity),
    State(PlaybackStatus),
    Favorite { id: i64, is_favorite: bool },
}

struct NotificationListener {
    events: Sender<Event>,
}

impl NotificationListener {
    async fn publish(&self, event: Event) {
        if let Err(e) = self.events.send(event).await {
            debug!("MusicNotificationManager: {}", ServiceError::from(e));
        }
    }
}

#[async_trait]
impl PlayerLifecycleListener for NotificationListener {
    async fn on_prepare(&self, entity: &MediaEntity) {
        self.publish(Event::Metadata(entity.clone())).await;
    }

    async fn on_metadata_changed(&self, entity: &MediaEntity) {
        self.publish(Event::Metadata(entity.clone())).await;
    }

    async fn on_state_changed(&self, status: PlaybackStatus) {
        self.publish(Event::State(status)).await;
    }
}

/// Shared between the manager and its consumer task.
struct Surface {
    renderer: Arc<dyn NotificationRenderer>,
    host: Arc<dyn ForegroundHost>,
    is_foreground: AtomicBool,
    published: RwLock<Option<Arc<MusicNotificationState>>>,
}

impl Surface {
    fn issue(&self, snapshot: &Arc<MusicNotificationState>) {
        let notification = self.renderer.update(snapshot);
        *self.published.write() = Some(snapshot.clone());

        if snapshot.is_playing {
            if self.is_foreground.swap(true, Ordering::AcqRel) {
                debug!("MusicNotificationManager: already in foreground");
            } else {
                debug!("MusicNotificationManager: start foreground");
                self.host.start_foreground(NOTIFICATION_ID, &notification);
            }
        } else if self.is_foreground.swap(false, Ordering::AcqRel) {
            debug!("MusicNotificationManager: pause foreground");
            self.host.stop_foreground(false);
        } else {
            debug!("MusicNotificationManager: pause requested while not in foreground");
        }
    }

    fn stop(&self) {
        if self.is_foreground.swap(false, Ordering::AcqRel) {
            self.host.stop_foreground(true);
        } else {
            warn!("MusicNotificationManager: stop requested while not in foreground");
        }
        self.renderer.cancel();
    }
}

/// Keeps the media notification in sync with the player.
pub struct MusicNotificationManager {
    surface: Arc<Surface>,
    lifecycle: Arc<PlayerLifecycle>,
    listener_id: ListenerId,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MusicNotificationManager {
    /// Attaches to `lifecycle` and `player_state` and starts the consumer.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        renderer: Arc<dyn NotificationRenderer>,
        host: Arc<dyn ForegroundHost>,
        lifecycle: Arc<PlayerLifecycle>,
        player_state: &PlayerState,
        capacity: usize,
    ) -> Self {
        let (events_tx, events_rx) = bounded(capacity.max(1));
        let surface = Arc::new(Surface {
            renderer,
            host,
            is_foreground: AtomicBool::new(false),
            published: RwLock::new(None),
        });
        let cancel = CancellationToken::new();

        let consumer = tokio::spawn(consume(events_rx, surface.clone(), cancel.clone()));
        let favorites = tokio::spawn(forward_favorites(
            player_state.subscribe(),
            events_tx.clone(),
            cancel.clone(),
        ));

        let listener_id =
            lifecycle.add_listener(Arc::new(NotificationListener { events: events_tx }));
        debug!(capacity, "MusicNotificationManager: started");

        Self {
            surface,
            lifecycle,
            listener_id,
            cancel,
            tasks: Mutex::new(vec![consumer, favorites]),
        }
    }

    /// Latest snapshot handed to the renderer.
    #[must_use]
    pub fn published(&self) -> Option<Arc<MusicNotificationState>> {
        self.surface.published.read().clone()
    }

    #[must_use]
    pub fn is_foreground(&self) -> bool {
        self.surface.is_foreground.load(Ordering::Acquire)
    }

    /// Detaches from the player, stops the consumer and removes the
    /// notification.
    pub async fn stop(&self) {
        self.lifecycle.remove_listener(self.listener_id);
        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await
                && !e.is_cancelled()
            {
                warn!("MusicNotificationManager: task ended abnormally: {e}");
            }
        }
        self.surface.stop();
        debug!("MusicNotificationManager: stopped");
    }
}

impl Drop for MusicNotificationManager {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.lifecycle.remove_listener(self.listener_id);
    }
}

async fn consume(events: Receiver<Event>, surface: Arc<Surface>, cancel: CancellationToken) {
    let mut live = Arc::new(MusicNotificationState::default());
    // Favorite states that arrived before the metadata of their item.
    let mut early_favorites: HashMap<i64, bool> = HashMap::new();
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        debug_assert_eq!(Arc::strong_count(&live), 1);
        let state = Arc::make_mut(&mut live);
        let changed = match &event {
            Event::Metadata(entity) => {
                let changed = state.update_metadata(entity);
                match early_favorites.remove(&entity.id) {
                    Some(is_favorite) => state.update_favorite(is_favorite) || changed,
                    None => changed,
                }
            }
            Event::State(status) => state.update_state(status),
            Event::Favorite { id, is_favorite } if *id == state.id => {
                state.update_favorite(*is_favorite)
            }
            Event::Favorite { id, is_favorite } => {
                early_favorites.insert(*id, *is_favorite);
                false
            }
        };
        if !changed {
            continue;
        }
        debug!(?event, "MusicNotificationManager: state changed");
        if !live.has_metadata() {
            continue;
        }

        let snapshot = Arc::new(live.as_ref().clone());
        surface.issue(&snapshot);
    }
    debug!("MusicNotificationManager: consumer finished");
}

async fn forward_favorites(
    mut updates: tokio::sync::broadcast::Receiver<PlayerStateEvent>,
    events: Sender<Event>,
    cancel: CancellationToken,
) {
    loop {
        let update = tokio::select! {
            () = cancel.cancelled() => break,
            update = updates.recv() => update,
        };
        match update {
            Ok(PlayerStateEvent::FavoriteChanged(favorite)) => {
                let event = Event::Favorite {
                    id: favorite.id,
                    is_favorite: favorite.state == FavoriteState::Favorite,
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "MusicNotificationManager: favorite updates lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
