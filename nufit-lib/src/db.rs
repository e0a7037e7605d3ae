//src/db.rs
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::persistence::{BlobStore, PersistenceError};

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database write failed: {0}")]
    WriteFailed(rusqlite::Error),
}

const DB_FILE_NAME: &str = "nufit.sqlite";
const APP_DATA_DIR: &str = "nufit"; // Same dir name as config

/// Gets the path to the SQLite database file within the app's data directory.
/// Exposed at crate root as `get_db_path_util`
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Initializes the blob table if it doesn't exist.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS blobs (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL -- RFC3339, last write
        )",
        [],
    )
    .map_err(DbError::Connection)?;
    Ok(())
}

pub fn get_blob(conn: &Connection, key: &str) -> Result<Option<String>, DbError> {
    conn.query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
    .map_err(DbError::QueryFailed)
}

pub fn set_blob(conn: &Connection, key: &str, blob: &str) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, blob, Utc::now()],
    )
    .map_err(DbError::WriteFailed)?;
    Ok(())
}

/// Blob store backed by a single SQLite table.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = open_db(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(DbError::Connection)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        get_blob(&self.conn, key).map_err(Into::into)
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        set_blob(&self.conn, key, blob).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqliteBlobStore::open_in_memory().unwrap();
        assert_eq!(store.get("state").unwrap(), None);
    }

    #[test]
    fn set_overwrites_previous_blob() {
        let store = SqliteBlobStore::open_in_memory().unwrap();
        store.set("state", "{\"a\":1}").unwrap();
        store.set("state", "{\"a\":2}").unwrap();
        store.set("profile", "{}").unwrap();
        assert_eq!(store.get("state").unwrap().as_deref(), Some("{\"a\":2}"));
        assert_eq!(store.get("profile").unwrap().as_deref(), Some("{}"));

        let rows: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }
}
