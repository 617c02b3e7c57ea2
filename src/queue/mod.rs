//! Playing queue engine.
//!
//! `QueueImpl` owns the active queue and its navigation rules, `QueueManager`
//! turns play intents into new queues, and `EnhancedShuffle` orders them.

use std::time::Duration;

use crate::config::UserSettings;

pub mod media_entity;
pub mod modes;
pub mod queue_impl;
pub mod queue_manager;
mod queue_manager_tests;
pub mod shuffle;
pub mod voice_search;

pub use {
    media_entity::{MediaEntity, PlayerMediaEntity, PositionInQueue},
    modes::{RepeatMode, RepeatModeState, ShuffleModeState},
    queue_impl::QueueImpl,
    queue_manager::{QueueGateways, QueueManager},
    shuffle::EnhancedShuffle,
    voice_search::{FocusKind, SearchFocus, VoiceSearchExtras, VoiceSearchParams},
};

/// Engine knobs read from user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTunables {
    pub skip_to_previous_threshold_ms: i64,
    pub recently_added_window: Duration,
    pub most_played_min_plays: u32,
    pub shuffle_max_passes: usize,
}

impl Default for QueueTunables {
    fn default() -> Self {
        Self::from(&UserSettings::default())
    }
}

impl From<&UserSettings> for QueueTunables {
    fn from(settings: &UserSettings) -> Self {
        Self {
            skip_to_previous_threshold_ms: settings.skip_to_previous_threshold_ms,
            recently_added_window: Duration::from_secs(
                u64::from(settings.recently_added_days) * 24 * 60 * 60,
            ),
            most_played_min_plays: settings.most_played_min_plays,
            shuffle_max_passes: settings.shuffle_max_passes,
        }
    }
}
