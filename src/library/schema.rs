//! Database schema definition and versioning for the engine's store.
//!
//! The store holds the library rows the queue resolves against plus the
//! engine's own state: the persisted queue, podcast positions, favorites,
//! history, play counts and last-played categories.

use std::path::Path;

use {
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    },
    thiserror::Error,
    tracing::debug,
};

/// Error type for schema operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),
    /// Schema migration error.
    #[error("Schema migration error: {reason}")]
    MigrationError { reason: String },
}

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

const CREATE_TABLES: [&str; 8] = [
    r#"
    CREATE TABLE songs (
        id INTEGER PRIMARY KEY,
        artist_id INTEGER NOT NULL,
        album_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        album_artist TEXT NOT NULL,
        album TEXT NOT NULL,
        duration_ms INTEGER NOT NULL,
        date_added INTEGER NOT NULL,
        path TEXT NOT NULL,
        track_number INTEGER NOT NULL DEFAULT 0,
        disc_number INTEGER NOT NULL DEFAULT 1,
        is_podcast BOOLEAN NOT NULL DEFAULT FALSE,
        genre TEXT
    )
    "#,
    r#"
    CREATE TABLE playlist_tracks (
        playlist_id INTEGER NOT NULL,
        song_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (playlist_id, position)
    )
    "#,
    r#"
    CREATE TABLE playing_queue (
        position INTEGER PRIMARY KEY,
        song_id INTEGER NOT NULL,
        id_in_playlist INTEGER NOT NULL,
        media_id TEXT NOT NULL,
        artist_id INTEGER NOT NULL,
        album_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        album_artist TEXT NOT NULL,
        album TEXT NOT NULL,
        duration_ms INTEGER NOT NULL,
        path TEXT NOT NULL,
        track_number INTEGER NOT NULL,
        disc_number INTEGER NOT NULL,
        is_podcast BOOLEAN NOT NULL
    )
    "#,
    r#"
    CREATE TABLE podcast_positions (
        id INTEGER PRIMARY KEY,
        position_ms INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE favorites (
        id INTEGER NOT NULL,
        track_type TEXT NOT NULL,
        PRIMARY KEY (id, track_type)
    )
    "#,
    r#"
    CREATE TABLE history (
        row_id INTEGER PRIMARY KEY AUTOINCREMENT,
        song_id INTEGER NOT NULL,
        is_podcast BOOLEAN NOT NULL,
        played_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE most_played (
        row_id INTEGER PRIMARY KEY AUTOINCREMENT,
        song_id INTEGER NOT NULL,
        category TEXT NOT NULL,
        category_id TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE last_played (
        kind TEXT NOT NULL,
        category_id TEXT NOT NULL,
        seq INTEGER NOT NULL,
        PRIMARY KEY (kind, category_id)
    )
    "#,
];

const CREATE_INDEXES: [&str; 5] = [
    "CREATE INDEX idx_songs_path ON songs (path)",
    "CREATE INDEX idx_songs_album_id ON songs (album_id)",
    "CREATE INDEX idx_songs_artist_id ON songs (artist_id)",
    "CREATE INDEX idx_songs_genre ON songs (genre)",
    "CREATE INDEX idx_most_played_category ON most_played (category, category_id)",
];

/// Creates and version-checks the schema.
pub struct SchemaManager {
    pool: SqlitePool,
}

impl SchemaManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initializes the database schema.
    ///
    /// Creates all tables on a fresh database and verifies the version of an
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if table creation fails or the stored version is
    /// not the current one.
    pub async fn initialize_schema(&self) -> Result<(), SchemaError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let current_version: Option<i32> =
            sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        match current_version {
            None => {
                debug!("Creating schema version {CURRENT_SCHEMA_VERSION}");
                self.create_tables().await?;
                sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                    .bind(CURRENT_SCHEMA_VERSION)
                    .execute(&self.pool)
                    .await?;
            }
            Some(version) if version == CURRENT_SCHEMA_VERSION => {}
            Some(version) => {
                return Err(SchemaError::MigrationError {
                    reason: format!("Schema migration from version {version} not implemented"),
                });
            }
        }

        Ok(())
    }

    async fn create_tables(&self) -> Result<(), SchemaError> {
        let mut tx = self.pool.begin().await?;
        for statement in CREATE_TABLES.iter().chain(CREATE_INDEXES.iter()) {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Gets the current schema version, or 0 if not initialized.
    pub async fn get_current_version(&self) -> Result<i32, SchemaError> {
        let version: Option<i32> = sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(version.unwrap_or(0))
    }
}

/// Creates a connection pool on a database file, creating it when missing.
///
/// # Errors
///
/// Returns `SchemaError` if the parent directory or the pool cannot be created.
pub async fn create_connection_pool(path: &Path) -> Result<SqlitePool, SchemaError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SchemaError::MigrationError {
            reason: format!("cannot create {}: {e}", parent.display()),
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Creates a single-connection in-memory pool.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// capped at one connection.
///
/// # Errors
///
/// Returns `SchemaError` if the connection cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, SchemaError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
