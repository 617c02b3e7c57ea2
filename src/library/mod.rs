//! Music library storage.
//!
//! Media identifiers, song models, the storage gateways the queue engine
//! depends on, and their SQLite implementation.

pub mod database;
pub mod gateway;
pub mod models;
pub mod schema;

pub use {
    database::LibraryDatabase,
    models::{
        FavoriteItemState, FavoriteState, FavoriteTrackType, MediaId, MediaIdCategory, Scrobble,
        Song, SpotifyTrack,
    },
    schema::{CURRENT_SCHEMA_VERSION, SchemaError, SchemaManager, create_connection_pool},
};
