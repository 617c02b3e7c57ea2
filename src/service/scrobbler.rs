//! Delayed scrobbling of started items.
//!
//! A started item is submitted only after it has been playing for the
//! configured delay. Starting another item first abandons the pending
//! submission, so skipped tracks are never scrobbled.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    parking_lot::Mutex,
    tokio::{task::JoinHandle, time::sleep},
    tracing::debug,
};

use crate::{
    error::{ErrorReporter, ResultExt},
    library::{Scrobble, database::now_unix_seconds, gateway::ScrobbleGateway},
    queue::MediaEntity,
    service::{ListenerId, PlayerLifecycle, PlayerLifecycleListener},
};

impl Scrobble {
    /// Listen of `entity` at `timestamp` (unix seconds).
    #[must_use]
    pub fn from_entity(entity: &MediaEntity, timestamp: i64) -> Self {
        Self {
            artist: entity.artist.clone(),
            title: entity.title.clone(),
            album: entity.album.clone(),
            duration_ms: entity.duration_ms,
            track_number: entity.track_number,
            timestamp,
        }
    }
}

struct ScrobbleListener {
    gateway: Arc<dyn ScrobbleGateway>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ScrobbleListener {
    fn schedule(&self, entity: MediaEntity) {
        let gateway = self.gateway.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let scrobble = Scrobble::from_entity(&entity, now_unix_seconds());

            let result = gateway
                .scrobble(&scrobble)
                .await
                .add_contextf(format_args!("Failed to scrobble {}", entity.id));
            ErrorReporter::swallow(result, "scrobble");
            let result = gateway
                .update_now_playing(&scrobble)
                .await
                .add_contextf(format_args!("Failed to update now playing {}", entity.id));
            ErrorReporter::swallow(result, "scrobble");
            debug!(id = entity.id, "Scrobbler: submitted");
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }
}

#[async_trait]
impl PlayerLifecycleListener for ScrobbleListener {
    async fn on_metadata_changed(&self, entity: &MediaEntity) {
        self.schedule(entity.clone());
    }
}

/// Submits listens to a [`ScrobbleGateway`] after a delay.
pub struct Scrobbler {
    lifecycle: Arc<PlayerLifecycle>,
    listener_id: ListenerId,
    listener: Arc<ScrobbleListener>,
}

impl Scrobbler {
    /// Attaches to `lifecycle`. Items are scrobbled `delay` after they start.
    #[must_use]
    pub fn start(
        gateway: Arc<dyn ScrobbleGateway>,
        lifecycle: Arc<PlayerLifecycle>,
        delay: Duration,
    ) -> Self {
        let listener = Arc::new(ScrobbleListener {
            gateway,
            delay,
            pending: Mutex::new(None),
        });
        let listener_id = lifecycle.add_listener(listener.clone());
        Self {
            lifecycle,
            listener_id,
            listener,
        }
    }

    /// Detaches from the player and drops any pending submission.
    pub fn stop(&self) {
        self.lifecycle.remove_listener(self.listener_id);
        self.listener.cancel();
    }
}

impl Drop for Scrobbler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use {
        async_channel::{Receiver, Sender, unbounded},
        async_trait::async_trait,
        tokio::time::timeout,
    };

    use crate::{
        error::ServiceError,
        library::{MediaId, Scrobble, Song, gateway::ScrobbleGateway},
        queue::MediaEntity,
        service::{PlayerLifecycle, Scrobbler},
        state::PlayerState,
    };

    const DELAY_MS: u64 = 50;
    const QUIET_MS: u64 = 200;
    const TEST_TIMEOUT_MS: u64 = 1000;

    struct RecordingGateway {
        scrobbled: Sender<String>,
        reject: Option<&'static str>,
    }

    #[async_trait]
    impl ScrobbleGateway for RecordingGateway {
        async fn scrobble(&self, scrobble: &Scrobble) -> Result<(), ServiceError> {
            if self.reject == Some(scrobble.title.as_str()) {
                return Err(ServiceError::Scrobble {
                    reason: "rejected".to_string(),
                });
            }
            let _ = self.scrobbled.try_send(scrobble.title.clone());
            Ok(())
        }

        async fn update_now_playing(&self, _scrobble: &Scrobble) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    fn setup(reject: Option<&'static str>) -> (Scrobbler, Arc<PlayerLifecycle>, Receiver<String>) {
        let (tx, rx) = unbounded();
        let lifecycle = Arc::new(PlayerLifecycle::new(PlayerState::new()));
        let scrobbler = Scrobbler::start(
            Arc::new(RecordingGateway {
                scrobbled: tx,
                reject,
            }),
            lifecycle.clone(),
            Duration::from_millis(DELAY_MS),
        );
        (scrobbler, lifecycle, rx)
    }

    fn entity(id: i64, title: &str) -> MediaEntity {
        MediaEntity::from_song(
            &Song {
                id,
                title: title.to_string(),
                artist: "Artist".to_string(),
                duration_ms: 180_000,
                ..Song::default()
            },
            0,
            &MediaId::songs_category(),
        )
    }

    #[tokio::test]
    async fn test_only_last_of_quick_skips_is_scrobbled() {
        let (_scrobbler, lifecycle, rx) = setup(None);

        for (id, title) in [(1, "One"), (2, "Two"), (3, "Three")] {
            lifecycle.metadata_changed(&entity(id, title)).await;
        }

        let title = timeout(Duration::from_millis(TEST_TIMEOUT_MS), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(title, "Three");
        assert!(
            timeout(Duration::from_millis(QUIET_MS), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_stop_drops_pending_scrobble() {
        let (scrobbler, lifecycle, rx) = setup(None);
        lifecycle.metadata_changed(&entity(1, "One")).await;

        scrobbler.stop();

        assert_eq!(lifecycle.listener_count(), 0);
        assert!(
            timeout(Duration::from_millis(QUIET_MS), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_rejected_scrobble_does_not_stop_later_ones() {
        let (_scrobbler, lifecycle, rx) = setup(Some("One"));

        lifecycle.metadata_changed(&entity(1, "One")).await;
        tokio::time::sleep(Duration::from_millis(DELAY_MS * 3)).await;
        lifecycle.metadata_changed(&entity(2, "Two")).await;

        let title = timeout(Duration::from_millis(TEST_TIMEOUT_MS), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(title, "Two");
    }

    #[test]
    fn test_scrobble_from_entity() {
        let scrobble = Scrobble::from_entity(&entity(4, "Four"), 1_700_000_000);
        assert_eq!(scrobble.title, "Four");
        assert_eq!(scrobble.artist, "Artist");
        assert_eq!(scrobble.duration_ms, 180_000);
        assert_eq!(scrobble.timestamp, 1_700_000_000);
    }
}
