//! Persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`. The pipeline
//! talks to storage through the [`MessageSource`] and [`EventStore`] traits;
//! [`SqliteStore`] is the production implementation of both.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::message::SourceMessage;
use crate::model::Event;

pub mod error;
pub mod event_repo;
pub mod ledger_repo;
pub mod message_repo;
pub mod migrations;

pub use error::StoreError;
pub use ledger_repo::LedgerEntry;

/// Where unprocessed newsletters come from.
pub trait MessageSource: Send + Sync {
    /// Returns up to `batch_size` messages that have no ledger marker yet,
    /// oldest first.
    fn fetch_unprocessed(&self, batch_size: u32) -> Result<Vec<SourceMessage>, StoreError>;
}

/// Where extracted events and processing markers go.
pub trait EventStore: Send + Sync {
    /// Whether a ledger marker exists for this message, successful or not.
    fn already_parsed(&self, message_id: &str) -> Result<bool, StoreError>;

    /// Writes or overwrites the ledger marker for a message.
    fn mark_processed(&self, message_id: &str, ok: bool, note: &str) -> Result<(), StoreError>;

    fn save_events(&self, events: &[Event]) -> Result<(), StoreError>;
}

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). All access is serialized through
/// a `Mutex`, which is fine for SQLite (which serializes writes anyway).
/// WAL mode is enabled for concurrent read performance.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.eventmill/data/eventmill.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".eventmill").join("data").join("eventmill.db"))
}

/// SQLite-backed implementation of both storage traits.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl MessageSource for SqliteStore {
    fn fetch_unprocessed(&self, batch_size: u32) -> Result<Vec<SourceMessage>, StoreError> {
        message_repo::fetch_unprocessed(&self.db, batch_size)
    }
}

impl EventStore for SqliteStore {
    fn already_parsed(&self, message_id: &str) -> Result<bool, StoreError> {
        ledger_repo::already_parsed(&self.db, message_id)
    }

    fn mark_processed(&self, message_id: &str, ok: bool, note: &str) -> Result<(), StoreError> {
        ledger_repo::upsert(&self.db, message_id, ok, note)
    }

    fn save_events(&self, events: &[Event]) -> Result<(), StoreError> {
        event_repo::save_all(&self.db, events)
    }
}
