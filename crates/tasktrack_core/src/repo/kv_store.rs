//! Key-value storage contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Read and blindly overwrite one string value per key.
//!
//! # Invariants
//! - `set` replaces the whole value; there is no merge or conditional write.
//! - `get` returns `None` only when the key was never written.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures raised by key-value storage backends.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Backend cannot serve requests (for example a poisoned lock).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Minimal durable string storage keyed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// SQLite-backed key-value store.
///
/// Owns its connection so it can be moved onto the snapshot writer thread.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection back to the caller.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local key-value store.
///
/// Clones share the same map, so a test can keep a handle while the store
/// itself is moved into a writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stand-in used when the real backend could not be opened.
///
/// Every read and write fails with `Unavailable`, so the store keeps working
/// in memory while each persistence attempt is logged as failed.
#[derive(Debug, Clone)]
pub struct UnavailableKeyValueStore {
    reason: String,
}

impl UnavailableKeyValueStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KeyValueStore for UnavailableKeyValueStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, UnavailableKeyValueStore,
    };
    use crate::db::open_db_in_memory;

    #[test]
    fn sqlite_get_missing_key_returns_none() {
        let store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());
        assert_eq!(store.get("tasks").unwrap(), None);
    }

    #[test]
    fn sqlite_set_overwrites_previous_value() {
        let store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());
        store.set("tasks", "[]").unwrap();
        store.set("tasks", "[\"a\"]").unwrap();

        assert_eq!(store.get("tasks").unwrap().as_deref(), Some("[\"a\"]"));
        let rows: i64 = store
            .into_inner()
            .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_keys_are_independent() {
        let store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn memory_clones_share_entries() {
        let store = MemoryKeyValueStore::new();
        let handle = store.clone();
        store.set("tasks", "x").unwrap();
        assert_eq!(handle.get("tasks").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn unavailable_store_fails_reads_and_writes() {
        let store = UnavailableKeyValueStore::new("unable to open database file");
        let read_err = store.get("tasks").unwrap_err();
        assert!(read_err.to_string().contains("unable to open database file"));
        assert!(store.set("tasks", "[]").is_err());
    }
}
