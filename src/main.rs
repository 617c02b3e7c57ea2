//! Playqueue - headless queue engine
//!
//! Restores the previous session's queue, optionally starts a new one from a
//! media id given on the command line, and reports what the player would load.

use std::{env::args, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use playqueue::{
    LibraryDatabase, MediaId, PlaybackState, PlayerLifecycle, PlayerMediaEntity, PlayerState,
    QueueManager, SettingsManager,
    config::get_database_path,
    library::gateway::{OfflineScrobbler, OfflineSpotify},
    queue::{QueueGateways, QueueTunables},
    service::{
        CurrentSong, CurrentSongGateways, ForegroundHost, MusicNotificationManager,
        MusicNotificationState, Notification, NotificationRenderer, PlaybackStatus, Scrobbler,
    },
};

/// Notification surface that writes to the log.
struct LogSurface;

impl NotificationRenderer for LogSurface {
    fn update(&self, state: &MusicNotificationState) -> Notification {
        let notification = Notification::from_state(state);
        info!(
            title = %notification.title,
            artist = %notification.text,
            playing = state.is_playing,
            "Notification updated"
        );
        notification
    }

    fn cancel(&self) {
        info!("Notification cancelled");
    }
}

impl ForegroundHost for LogSurface {
    fn start_foreground(&self, id: u32, _notification: &Notification) {
        info!(id, "Entered foreground");
    }

    fn stop_foreground(&self, remove_notification: bool) {
        info!(remove_notification, "Left foreground");
    }
}

/// Main entry point.
///
/// Loads settings, opens the library and runs the queue engine once.
#[tokio::main]
async fn main() -> Result<()> {
    let settings = Arc::new(SettingsManager::new().context("Failed to load settings")?);
    let (tunables, log_filter, capacity, scrobble_delay) = {
        let current = settings.get_settings();
        (
            QueueTunables::from(&*current),
            current.log_filter.clone(),
            current.event_channel_capacity,
            Duration::from_millis(current.scrobble_delay_ms),
        )
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let database_path = get_database_path();
    let database = LibraryDatabase::open(&database_path)
        .await
        .with_context(|| format!("Failed to open library at {}", database_path.display()))?;

    let player_state = PlayerState::new();
    let lifecycle = Arc::new(PlayerLifecycle::new(player_state.clone()));
    let manager = QueueManager::new(
        QueueGateways::from_database(&database, settings.clone(), Arc::new(OfflineSpotify)),
        player_state.clone(),
        tunables,
    );
    let current_song = CurrentSong::start(
        CurrentSongGateways::from_database(&database, settings.clone()),
        player_state.clone(),
        lifecycle.clone(),
        capacity,
    );
    let scrobbler = Scrobbler::start(
        Arc::new(OfflineScrobbler),
        lifecycle.clone(),
        scrobble_delay,
    );
    let surface = Arc::new(LogSurface);
    let notifications = MusicNotificationManager::start(
        surface.clone(),
        surface,
        lifecycle.clone(),
        &player_state,
        capacity,
    );

    match manager.prepare().await.context("Failed to restore queue")? {
        Some(restored) => {
            report("Restored", &restored);
            lifecycle.prepare(&restored.entity).await;
        }
        None => info!("No queue to restore"),
    }

    if let Some(raw) = args().nth(1) {
        let media_id: MediaId = raw.parse().context("Invalid media id")?;
        match manager.handle_play_from_media_id(&media_id, None).await? {
            Some(started) => {
                report("Playing", &started);
                lifecycle.metadata_changed(&started.entity).await;
                lifecycle
                    .state_changed(PlaybackStatus {
                        state: PlaybackState::Playing,
                        position_ms: started.bookmark_ms,
                    })
                    .await;
            }
            None => warn!(%media_id, "Nothing to play"),
        }
    }

    manager.queue().flush().await;
    scrobbler.stop();
    current_song.stop().await;
    notifications.stop().await;
    Ok(())
}

fn report(action: &str, item: &PlayerMediaEntity) {
    info!(
        id = item.entity.id,
        title = %item.entity.title,
        artist = %item.entity.artist,
        position = ?item.position_in_queue,
        bookmark_ms = item.bookmark_ms,
        "{action}"
    );
}
