//! Shared player state with broadcast change notifications.
//!
//! The queue owner and the media-session services publish here; UI layers or
//! remote controls subscribe without touching the owners directly.

pub mod player_state;

pub use player_state::{PlayerState, PlayerStateEvent, PlayingQueue};
