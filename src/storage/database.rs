//! `SQLite` database holding the named persistent slots.
//!
//! The database is stored at `~/.savoir/savoir.db`. Several savoir-sync
//! processes may open it at once, so writers wait on each other's locks
//! instead of failing.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::SyncError;

/// Schema version recorded in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

/// How long a writer waits for another process's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or database cannot be created.
    pub fn open() -> Result<Self, SyncError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema created.
    pub fn open_at(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path).map_err(|e| {
            SyncError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        Self::init(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema created.
    pub fn open_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SyncError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, SyncError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| SyncError::Database(format!("Failed to set busy timeout: {e}")))?;
        // A write must be on disk before the enqueue is acknowledged
        conn.execute_batch("PRAGMA synchronous = FULL;")
            .map_err(|e| SyncError::Database(format!("Failed to set synchronous mode: {e}")))?;

        ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection, for transactions.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Create the `local_storage` table on a fresh database.
///
/// `local_storage` maps a slot name to one serialized value, mirroring the
/// browser's key/value store.
fn ensure_schema(conn: &Connection) -> Result<(), SyncError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(&format!(
        r"
        BEGIN IMMEDIATE;
        CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        PRAGMA user_version = {SCHEMA_VERSION};
        COMMIT;
        "
    ))
    .map_err(|e| SyncError::Database(format!("Failed to create schema: {e}")))
}
