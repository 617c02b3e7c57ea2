//! Single owner of the active playing queue.
//!
//! Every read and mutation of the queue goes through `QueueImpl`. Mutations
//! replace the snapshot under a write lock, then broadcast it on the player
//! state bus and persist it from a background task. Only the newest persist
//! task is kept; starting a new one aborts the previous one.
//!
//! Every broadcast takes a generation number. A deferred broadcast from a
//! background task is dropped once a newer snapshot has been published, so
//! subscribers never see the queue move backwards.

use std::sync::Arc;

use {
    parking_lot::{Mutex, RwLock},
    tokio::{runtime::Handle, task::JoinHandle},
    tracing::{debug, error, warn},
};

use crate::{
    error::QueueError,
    library::{
        Song,
        gateway::{MusicPreferencesGateway, PlayingQueueGateway, TrackGateway},
    },
    queue::{
        EnhancedShuffle, MediaEntity, PositionInQueue, QueueTunables, RepeatMode,
        RepeatModeState,
    },
    state::{PlayerState, PlayingQueue},
};

/// The active queue and its navigation rules.
pub struct QueueImpl {
    queue: RwLock<PlayingQueue>,
    repeat_mode: Arc<RepeatModeState>,
    preferences: Arc<dyn MusicPreferencesGateway>,
    track_gateway: Arc<dyn TrackGateway>,
    queue_gateway: Arc<dyn PlayingQueueGateway>,
    player_state: PlayerState,
    shuffle: EnhancedShuffle,
    skip_to_previous_threshold_ms: i64,
    persist_task: Mutex<Option<JoinHandle<()>>>,
    /// Latest broadcast generation handed out.
    generation: Arc<Mutex<u64>>,
}

impl QueueImpl {
    #[must_use]
    pub fn new(
        track_gateway: Arc<dyn TrackGateway>,
        queue_gateway: Arc<dyn PlayingQueueGateway>,
        preferences: Arc<dyn MusicPreferencesGateway>,
        repeat_mode: Arc<RepeatModeState>,
        player_state: PlayerState,
        tunables: &QueueTunables,
    ) -> Self {
        Self {
            queue: RwLock::new(PlayingQueue::default()),
            repeat_mode,
            preferences,
            track_gateway,
            queue_gateway,
            player_state,
            shuffle: EnhancedShuffle::new(tunables.shuffle_max_passes),
            skip_to_previous_threshold_ms: tunables.skip_to_previous_threshold_ms,
            persist_task: Mutex::new(None),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Replaces the whole queue.
    ///
    /// `index` is clamped into range. With `update_immediate` the snapshot is
    /// broadcast before returning, otherwise from the background task. With
    /// `persist` the queue is written to the playing-queue gateway.
    pub fn update_state(
        &self,
        items: Vec<MediaEntity>,
        index: usize,
        update_immediate: bool,
        persist: bool,
    ) {
        let (snapshot, deferred) = {
            let mut queue = self.queue.write();
            let current_index = items.len().checked_sub(1).map(|last| index.min(last));
            *queue = PlayingQueue {
                items,
                current_index,
            };
            let snapshot = queue.clone();
            let deferred = if update_immediate {
                self.publish(snapshot.clone());
                None
            } else {
                Some(self.next_generation())
            };
            (snapshot, deferred)
        };
        debug!(
            size = snapshot.items.len(),
            current = ?snapshot.current_index,
            update_immediate,
            persist,
            "QueueImpl: state replaced"
        );

        self.save_current_id(&snapshot);
        if persist || deferred.is_some() {
            self.spawn_background(snapshot, deferred, persist);
        }
    }

    #[must_use]
    pub fn get_current_song(&self) -> Option<MediaEntity> {
        self.queue.read().current().cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.read().items.is_empty()
    }

    /// Copy of the current queue.
    #[must_use]
    pub fn snapshot(&self) -> PlayingQueue {
        self.queue.read().clone()
    }

    /// Moves to the item with `id_in_playlist`.
    pub fn get_song_by_id(&self, id_in_playlist: i64) -> Option<MediaEntity> {
        self.navigate(|queue| {
            queue
                .items
                .iter()
                .position(|item| item.id_in_playlist == id_in_playlist)
        })
    }

    /// Advances the queue. `track_ended` distinguishes natural completion from
    /// a user skip.
    pub fn get_next_song(&self, track_ended: bool) -> Option<MediaEntity> {
        let repeat = self.repeat_mode.get();
        self.navigate(|queue| {
            let current = queue.current_index?;
            if repeat == RepeatMode::One && track_ended {
                Some(current)
            } else if current + 1 < queue.items.len() {
                Some(current + 1)
            } else if repeat == RepeatMode::None {
                debug!("QueueImpl: end of queue reached");
                None
            } else {
                Some(0)
            }
        })
    }

    /// Steps back, or restarts the current item when `player_bookmark_ms` is
    /// past the skip-to-previous threshold.
    pub fn get_previous_song(&self, player_bookmark_ms: i64) -> Option<MediaEntity> {
        let repeat = self.repeat_mode.get();
        let threshold = self.skip_to_previous_threshold_ms;
        self.navigate(|queue| {
            let current = queue.current_index?;
            if repeat == RepeatMode::One || player_bookmark_ms > threshold {
                Some(current)
            } else if current > 0 {
                Some(current - 1)
            } else if repeat == RepeatMode::All {
                Some(queue.items.len() - 1)
            } else {
                Some(current)
            }
        })
    }

    /// Exchanges the items at two absolute positions.
    pub fn handle_swap(&self, from: usize, to: usize) {
        self.mutate("swap", |items, current| {
            if from == to || from >= items.len() || to >= items.len() {
                return false;
            }
            items.swap(from, to);
            if *current == from {
                *current = to;
            } else if *current == to {
                *current = from;
            }
            true
        });
    }

    /// Exchanges two items addressed relative to the current one.
    pub fn handle_swap_relative(&self, from: usize, to: usize) {
        let Some((from, to)) = self.relative(from).zip(self.relative(to)) else {
            return;
        };
        self.handle_swap(from, to);
    }

    /// Moves the item at a relative position right after the current item.
    pub fn handle_move_relative(&self, position: usize) {
        let Some(real) = self.relative(position) else {
            return;
        };
        self.mutate("move", |items, current| {
            if real >= items.len() {
                return false;
            }
            let target = *current + 1;
            if real == target {
                return false;
            }
            let item = items.remove(real);
            items.insert(target, item);
            true
        });
    }

    /// Removes the item at an absolute position. The current item stays.
    pub fn handle_remove(&self, position: usize) {
        self.mutate("remove", |items, current| {
            if position >= items.len() {
                return false;
            }
            if position == *current {
                warn!(position, "QueueImpl: refusing to remove the current item");
                return false;
            }
            items.remove(position);
            if position < *current {
                *current -= 1;
            }
            true
        });
    }

    /// Removes the item at a position relative to the current one.
    pub fn handle_remove_relative(&self, position: usize) {
        if let Some(real) = self.relative(position) {
            self.handle_remove(real);
        }
    }

    /// Inserts the resolved songs right after the current item.
    ///
    /// Returns how many items were inserted; nothing is inserted into an
    /// empty queue.
    pub async fn play_next(&self, song_ids: &[i64]) -> Result<usize, QueueError> {
        let songs = self.resolve(song_ids).await?;
        let count = songs.len();
        let applied = self.mutate("play next", move |items, current| {
            if items.is_empty() || songs.is_empty() {
                return false;
            }
            let fresh = fresh_entities(items, &songs);
            let at = *current + 1;
            items.splice(at..at, fresh);
            true
        });
        Ok(if applied { count } else { 0 })
    }

    /// Appends the resolved songs to the end of the queue.
    pub async fn play_later(&self, song_ids: &[i64]) -> Result<usize, QueueError> {
        let songs = self.resolve(song_ids).await?;
        let count = songs.len();
        let applied = self.mutate("play later", move |items, _| {
            if items.is_empty() || songs.is_empty() {
                return false;
            }
            let fresh = fresh_entities(items, &songs);
            items.extend(fresh);
            true
        });
        Ok(if applied { count } else { 0 })
    }

    /// Restores insertion order.
    pub fn sort(&self) {
        self.mutate("sort", |items, current| {
            let current_key = items[*current].id_in_playlist;
            items.sort_by_key(|item| item.id_in_playlist);
            *current = items
                .iter()
                .position(|item| item.id_in_playlist == current_key)
                .unwrap_or(0);
            true
        });
    }

    /// Puts the current item first and shuffles everything after it.
    pub fn shuffle(&self) {
        let shuffle = self.shuffle;
        self.mutate("shuffle", move |items, current| {
            let head = items.remove(*current);
            let rest = shuffle.shuffle(std::mem::take(items));
            items.push(head);
            items.extend(rest);
            *current = 0;
            true
        });
    }

    /// Re-announces the queue so position consumers pick up the new mode.
    pub fn on_repeat_mode_changed(&self) {
        let queue = self.queue.read();
        self.publish(queue.clone());
    }

    #[must_use]
    pub fn compute_position_in_queue(&self, list_len: usize, position: usize) -> PositionInQueue {
        PositionInQueue::compute(position, list_len, self.repeat_mode.is_repeat_all())
    }

    #[must_use]
    pub fn current_position_in_queue(&self) -> PositionInQueue {
        let queue = self.queue.read();
        let index = queue.current_index.unwrap_or(0);
        self.compute_position_in_queue(queue.items.len(), index)
    }

    /// Waits for the pending background broadcast and persist, if any.
    pub async fn flush(&self) {
        let task = self.persist_task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            error!("QueueImpl: persist task failed: {e}");
        }
    }

    fn relative(&self, position: usize) -> Option<usize> {
        let current = self.queue.read().current_index?;
        Some(position + current + 1)
    }

    /// Applies a position change and announces it. The queue content does
    /// not change so nothing is persisted.
    fn navigate(&self, pick: impl FnOnce(&PlayingQueue) -> Option<usize>) -> Option<MediaEntity> {
        let snapshot = {
            let mut queue = self.queue.write();
            let index = pick(&*queue)?;
            queue.current_index = Some(index);
            self.publish(queue.clone());
            queue.clone()
        };
        self.save_current_id(&snapshot);
        snapshot.current().cloned()
    }

    /// Runs `edit` on a non-empty queue; `edit` returns whether it changed
    /// anything.
    fn mutate(
        &self,
        action: &str,
        edit: impl FnOnce(&mut Vec<MediaEntity>, &mut usize) -> bool,
    ) -> bool {
        let snapshot = {
            let mut queue = self.queue.write();
            let Some(mut current) = queue.current_index else {
                debug!("QueueImpl: {action} ignored on empty queue");
                return false;
            };
            if !edit(&mut queue.items, &mut current) {
                debug!("QueueImpl: {action} made no change");
                return false;
            }
            queue.current_index = Some(current);
            self.publish(queue.clone());
            queue.clone()
        };
        debug!(
            size = snapshot.items.len(),
            current = ?snapshot.current_index,
            "QueueImpl: {action} applied"
        );
        self.save_current_id(&snapshot);
        self.spawn_background(snapshot, None, true);
        true
    }

    /// Broadcasts `snapshot` now. Callers hold the queue lock so broadcasts
    /// leave in the order the queue changed.
    fn publish(&self, snapshot: PlayingQueue) {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.player_state.update_queue(snapshot);
    }

    fn next_generation(&self) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        *generation
    }

    async fn resolve(&self, song_ids: &[i64]) -> Result<Vec<Song>, QueueError> {
        let mut songs = Vec::with_capacity(song_ids.len());
        for id in song_ids {
            match self.track_gateway.get_by_id(*id).await? {
                Some(song) => songs.push(song),
                None => warn!(id, "QueueImpl: song not found, skipped"),
            }
        }
        Ok(songs)
    }

    fn save_current_id(&self, snapshot: &PlayingQueue) {
        if let Some(current) = snapshot.current()
            && let Err(e) = self
                .preferences
                .set_last_id_in_playlist(current.id_in_playlist)
        {
            warn!("QueueImpl: failed to save last id in playlist: {e}");
        }
    }

    /// Persists `snapshot` and, with a `deferred` generation, broadcasts it
    /// unless something newer was published first.
    fn spawn_background(&self, snapshot: PlayingQueue, deferred: Option<u64>, persist: bool) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("QueueImpl: no runtime, queue not persisted");
            if let Some(stamp) = deferred {
                publish_if_current(&self.generation, stamp, &self.player_state, &snapshot);
            }
            return;
        };

        let gateway = self.queue_gateway.clone();
        let player_state = self.player_state.clone();
        let generation = self.generation.clone();
        let task = runtime.spawn(async move {
            if let Some(stamp) = deferred {
                publish_if_current(&generation, stamp, &player_state, &snapshot);
            }
            if persist {
                match gateway.update(&snapshot.items).await {
                    Ok(()) => debug!(size = snapshot.items.len(), "QueueImpl: queue persisted"),
                    Err(e) => error!("QueueImpl: failed to persist queue: {e}"),
                }
            }
        });

        if let Some(previous) = self.persist_task.lock().replace(task) {
            previous.abort();
        }
    }
}

fn publish_if_current(
    generation: &Mutex<u64>,
    stamp: u64,
    player_state: &PlayerState,
    snapshot: &PlayingQueue,
) {
    let latest = generation.lock();
    if *latest == stamp {
        player_state.update_queue(snapshot.clone());
    } else {
        debug!(stamp, latest = *latest, "QueueImpl: deferred broadcast superseded");
    }
}

/// Builds queue items for `songs` with `id_in_playlist` values above the
/// current maximum. Each song is filed under its own library category.
fn fresh_entities(items: &[MediaEntity], songs: &[Song]) -> Vec<MediaEntity> {
    let next_id = items
        .iter()
        .map(|item| item.id_in_playlist)
        .max()
        .map_or(0, |max| max + 1);
    songs
        .iter()
        .zip(next_id..)
        .map(|(song, id_in_playlist)| {
            MediaEntity::from_song(song, id_in_playlist, &song.parent_media_id())
        })
        .collect()
}
