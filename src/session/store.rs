//! The key-value store that holds the session and is shared by every tab.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::Error;

/// The key of the credential bundle, a JSON object with the user name and token.
pub const TOKEN_KEY: &str = "token";
/// The key of the last activity timestamp, the JSON string of the epoch milliseconds.
pub const LAST_ACTIVITY_KEY: &str = "lastActivity";

/// A persisted string key-value store visible to every tab of the client.
///
/// All methods take `&self` since the store is shared between independent
/// execution contexts. Implementations must not emit `tracing` events because
/// the application log is itself written to a store.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, or `None` if there is no such key.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key` from the store. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// An in-memory [KeyValueStore].
///
/// Clones share the same entries, so each clone can stand in for one tab
/// reading and writing the same browser storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().map_err(|_| Error::StoreLockError)?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().map_err(|_| Error::StoreLockError)?;
        entries.insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().map_err(|_| Error::StoreLockError)?;
        entries.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod memory_store_tests {
    use crate::session::{KeyValueStore, MemoryStore};

    #[test]
    fn get_returns_none_for_missing_key() {
        let store = MemoryStore::new();

        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn set_replaces_existing_value() {
        let store = MemoryStore::new();

        store.set("lastActivity", "\"1\"").unwrap();
        store.set("lastActivity", "\"2\"").unwrap();

        assert_eq!(store.get("lastActivity").unwrap().as_deref(), Some("\"2\""));
    }

    #[test]
    fn clones_share_entries() {
        let first_tab = MemoryStore::new();
        let second_tab = first_tab.clone();

        first_tab.set("token", "abc").unwrap();

        assert_eq!(second_tab.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn remove_missing_key_is_not_an_error() {
        let store = MemoryStore::new();

        assert_eq!(store.remove("token"), Ok(()));
    }
}
