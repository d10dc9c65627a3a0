mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

/// Namespace holding the download-protection settings.
pub const DEFAULT_NAMESPACE: &str = "edd";

/// Errors raised by a settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Whole-value key-value storage for plugin configuration.
///
/// Writes are last-writer-wins; implementations decide their own locking.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "htaccess-editor")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("settings.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::upgrade(&conn)
    }

    /// A settings store scoped to `namespace`.
    pub fn settings(&self, namespace: impl Into<String>) -> Settings {
        Settings {
            db: self.clone(),
            namespace: namespace.into(),
        }
    }

    // ============================================================
    // Setting operations
    // ============================================================

    pub fn get_setting(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE namespace = ? AND key = ?",
                (namespace, key),
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO settings (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (namespace, key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, namespace: &str, key: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "DELETE FROM settings WHERE namespace = ? AND key = ?",
            (namespace, key),
        )?;
        Ok(rows > 0)
    }
}

/// Settings under one namespace of a [`Database`].
#[derive(Clone)]
pub struct Settings {
    db: Database,
    namespace: String,
}

impl Settings {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl SettingsStore for Settings {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.db.get_setting(&self.namespace, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.set_setting(&self.namespace, key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db.delete_setting(&self.namespace, key).map(|_| ())
    }
}
