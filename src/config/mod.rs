//! Persisted player preferences and engine configuration.
//!
//! Settings live in a JSON file following the XDG Base Directory layout.

pub mod settings;

pub use settings::{
    LastMetadata, SettingsError, SettingsManager, UserSettings, get_config_path,
    get_database_path,
};
