//! Media-session services driven by the player lifecycle.

pub mod current_song;
pub mod notification;
pub mod player_lifecycle;
pub mod scrobbler;

pub use {
    current_song::{CurrentSong, CurrentSongGateways},
    notification::{
        Event, ForegroundHost, MusicNotificationManager, MusicNotificationState, NOTIFICATION_ID,
        Notification, NotificationRenderer,
    },
    player_lifecycle::{
        ListenerId, PlaybackState, PlaybackStatus, PlayerLifecycle, PlayerLifecycleListener,
    },
    scrobbler::Scrobbler,
};
