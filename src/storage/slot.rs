//! Named persistent slots.
//!
//! A slot store is a string key/value store with whole-value overwrite
//! semantics. The offline queue lives in one slot as a JSON array.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::Database;
use crate::error::SyncError;

/// A key/value store holding one serialized value per slot.
pub trait SlotStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, SyncError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the write is rejected.
    fn set_item(&self, key: &str, value: &str) -> Result<(), SyncError>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), SyncError>;

    /// Atomically replace the value under `key` with `apply(current)`.
    ///
    /// No other writer, in this process or another, can change the slot
    /// between the read and the write. Returning `None` removes the slot.
    ///
    /// # Errors
    ///
    /// Returns the error from `apply`, or `SyncError::Storage` if the write is
    /// rejected. The slot is left unchanged in both cases.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>, SyncError>,
    ) -> Result<(), SyncError>;
}

fn check_quota(key: &str, value: &str, max_bytes: Option<usize>) -> Result<(), SyncError> {
    match max_bytes {
        Some(max) if value.len() > max => Err(SyncError::Storage(format!(
            "quota exceeded writing '{key}': {} bytes > {max} bytes",
            value.len()
        ))),
        _ => Ok(()),
    }
}

fn read_slot(conn: &Connection, key: &str) -> Result<Option<String>, SyncError> {
    conn.query_row(
        "SELECT value FROM local_storage WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| SyncError::Database(format!("Failed to read slot '{key}': {e}")))
}

fn write_slot(conn: &Connection, key: &str, value: &str) -> Result<(), SyncError> {
    conn.execute(
        r"INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
          ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )
    .map_err(|e| SyncError::Storage(format!("Failed to write slot '{key}': {e}")))?;

    Ok(())
}

fn delete_slot(conn: &Connection, key: &str) -> Result<(), SyncError> {
    conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])
        .map_err(|e| SyncError::Storage(format!("Failed to remove slot '{key}': {e}")))?;

    Ok(())
}

/// Slot store backed by the `local_storage` table.
pub struct SqliteStore {
    db: Mutex<Database>,
    max_bytes: Option<usize>,
}

impl SqliteStore {
    /// Create a store over an open database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            max_bytes: None,
        }
    }

    /// Reject writes larger than `max_bytes`.
    #[must_use]
    pub const fn with_quota(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, SyncError> {
        self.db
            .lock()
            .map_err(|_| SyncError::Database("Database lock poisoned".to_string()))
    }
}

impl SlotStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SyncError> {
        read_slot(self.db()?.connection(), key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SyncError> {
        check_quota(key, value, self.max_bytes)?;
        write_slot(self.db()?.connection(), key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), SyncError> {
        delete_slot(self.db()?.connection(), key)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>, SyncError>,
    ) -> Result<(), SyncError> {
        let mut db = self.db()?;
        // IMMEDIATE takes the write lock before the read
        let tx = db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| SyncError::Storage(format!("Failed to lock slot '{key}': {e}")))?;

        match apply(read_slot(&tx, key)?)? {
            Some(value) => {
                check_quota(key, &value, self.max_bytes)?;
                write_slot(&tx, key, &value)?;
            }
            None => delete_slot(&tx, key)?,
        }

        tx.commit()
            .map_err(|e| SyncError::Storage(format!("Failed to commit slot '{key}': {e}")))
    }
}

/// Slot store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    max_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes larger than `max_bytes`.
    #[must_use]
    pub fn with_quota(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, SyncError> {
        self.items
            .lock()
            .map_err(|_| SyncError::Storage("Memory store lock poisoned".to_string()))
    }
}

impl SlotStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SyncError> {
        check_quota(key, value, self.max_bytes)?;
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SyncError> {
        self.items()?.remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>, SyncError>,
    ) -> Result<(), SyncError> {
        let mut items = self.items()?;

        match apply(items.get(key).cloned())? {
            Some(value) => {
                check_quota(key, &value, self.max_bytes)?;
                items.insert(key.to_string(), value);
            }
            None => {
                items.remove(key);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_store() -> SqliteStore {
        SqliteStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_sqlite_set_get_remove() {
        let store = sqlite_store();

        assert_eq!(store.get_item("offlineQueue").unwrap(), None);

        store.set_item("offlineQueue", "[1]").unwrap();
        store.set_item("offlineQueue", "[1,2]").unwrap();
        assert_eq!(store.get_item("offlineQueue").unwrap().as_deref(), Some("[1,2]"));

        store.remove_item("offlineQueue").unwrap();
        assert_eq!(store.get_item("offlineQueue").unwrap(), None);

        // Removing again is fine
        store.remove_item("offlineQueue").unwrap();
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("slots.db");

        {
            let store = SqliteStore::new(Database::open_at(&path).unwrap());
            store.set_item("fontSize", "18").unwrap();
        }

        let store = SqliteStore::new(Database::open_at(&path).unwrap());
        assert_eq!(store.get_item("fontSize").unwrap().as_deref(), Some("18"));
    }

    #[test]
    fn test_sqlite_quota() {
        let store = sqlite_store().with_quota(Some(4));

        store.set_item("k", "1234").unwrap();
        let err = store.set_item("k", "12345").unwrap_err();

        assert!(matches!(err, SyncError::Storage(_)));
        // Previous value untouched
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_sqlite_update_appends_and_removes() {
        let store = sqlite_store();
        store.set_item("k", "a").unwrap();

        store
            .update("k", &mut |current| Ok(current.map(|v| format!("{v}b"))))
            .unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("ab"));

        store.update("k", &mut |_| Ok(None)).unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_update_failure_rolls_back() {
        let store = sqlite_store().with_quota(Some(4));
        store.set_item("k", "1234").unwrap();

        let err = store
            .update("k", &mut |_| Ok(Some("12345".to_string())))
            .unwrap_err();
        assert!(matches!(err, SyncError::Storage(_)));

        let err = store
            .update("k", &mut |_| Err(SyncError::Parse("bad".to_string())))
            .unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));

        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_sqlite_update_sees_other_handle_writes() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("slots.db");
        let first = SqliteStore::new(Database::open_at(&path).unwrap());
        let second = SqliteStore::new(Database::open_at(&path).unwrap());

        first.set_item("k", "a").unwrap();
        second
            .update("k", &mut |current| {
                Ok(Some(format!("{}b", current.unwrap_or_default())))
            })
            .unwrap();

        assert_eq!(first.get_item("k").unwrap().as_deref(), Some("ab"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with_quota(Some(3));

        store.set_item("a", "xyz").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("xyz"));
        assert!(store.set_item("a", "wxyz").is_err());

        store.update("a", &mut |_| Ok(Some("wxyz".to_string()))).unwrap_err();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("xyz"));

        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);
    }
}
