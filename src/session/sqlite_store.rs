//! Implements a SQLite backed key-value store so that separate processes can
//! share one session.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, session::KeyValueStore};

/// A [KeyValueStore] that persists entries in a SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a store on an existing connection, adding the table for the
    /// entries if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [Error::SqlError] if the table could not be created.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Result<Self, Error> {
        {
            let connection = connection.lock().map_err(|_| Error::StoreLockError)?;
            create_store_table(&connection)?;
        }

        Ok(Self { connection })
    }

    /// Open (or create) the database file at `path` and use it as a store.
    ///
    /// # Errors
    ///
    /// Returns a [Error::SqlError] if the file could not be opened or the
    /// table could not be created.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let connection = Connection::open(path)?;

        Self::new(Arc::new(Mutex::new(connection)))
    }
}

fn create_store_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS session_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let connection = self.connection.lock().map_err(|_| Error::StoreLockError)?;

        connection
            .prepare("SELECT value FROM session_store WHERE key = :key")?
            .query_row(&[(":key", key)], |row| row.get(0))
            .optional()
            .map_err(Error::from)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::StoreLockError)?;

        connection.execute(
            "INSERT INTO session_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let connection = self.connection.lock().map_err(|_| Error::StoreLockError)?;

        connection.execute("DELETE FROM session_store WHERE key = ?1", (key,))?;

        Ok(())
    }
}
