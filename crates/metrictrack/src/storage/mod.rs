//! Persistence backends for metrictrack.
//!
//! The record store talks to its backend through the narrow
//! [`KeyValueStore`] interface: one fixed key holds the serialized
//! collection. Two backends are provided:
//!
//! - [`SqliteStore`]: durable `SQLite` storage used by the `mtrack` binary.
//! - [`MemoryStore`]: an in-memory map, used as a fake in tests.

pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A string key-value persistence backend.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite`-backed key-value storage.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        Self::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn initialize_schema(conn: &Connection) -> Result<()> {
        for statement in schema::SCHEMA_STATEMENTS {
            conn.execute(statement, [])?;
        }
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(schema::SELECT_VALUE, [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(schema::UPSERT_VALUE, params![key, value])?;
        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }
}

/// In-memory key-value storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one key.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = SqliteStore::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_get_absent() {
        let storage = create_test_storage();
        assert_eq!(storage.get("metrics").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut storage = create_test_storage();
        storage.set("metrics", "[]").unwrap();
        assert_eq!(storage.get("metrics").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage = create_test_storage();
        storage.set("metrics", "[1]").unwrap();
        storage.set("metrics", "[2]").unwrap();
        assert_eq!(storage.get("metrics").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut storage = create_test_storage();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_unicode_value() {
        let mut storage = create_test_storage();
        storage.set("metrics", "Выручка «2026»").unwrap();
        assert_eq!(
            storage.get("metrics").unwrap().as_deref(),
            Some("Выручка «2026»")
        );
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("metrics.db");

        {
            let mut storage = SqliteStore::open(&db_path).unwrap();
            storage.set("metrics", r#"[{"name":"KPI"}]"#).unwrap();
            assert_eq!(storage.path(), db_path);
        }

        let storage = SqliteStore::open(&db_path).unwrap();
        assert_eq!(
            storage.get("metrics").unwrap().as_deref(),
            Some(r#"[{"name":"KPI"}]"#)
        );
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_store_with_value() {
        let store = MemoryStore::with_value("metrics", "[]");
        assert_eq!(store.get("metrics").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_mut_ref_delegates() {
        let mut store = MemoryStore::new();
        {
            let mut borrowed = &mut store;
            KeyValueStore::set(&mut borrowed, "k", "v").unwrap();
        }
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
