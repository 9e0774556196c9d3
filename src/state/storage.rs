//! Durable key/value storage for the session snapshot and cookies.
//!
//! SYSTEM CONTEXT
//! ==============
//! The native counterpart of browser `localStorage`: string values under
//! string keys that survive a process restart. [`FileStore`] keeps one
//! `<key>.json` file per key under the state directory; [`MemoryStore`] backs
//! tests and embedders that do not want anything on disk.
//!
//! ERROR HANDLING
//! ==============
//! Store operations return [`StorageError`]; the JSON helpers log and absorb
//! failures because every value stored here is a cache of backend state.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key of the durable session snapshot (a serialized `UserRecord`).
pub const USER_KEY: &str = "user";

/// Key of the persisted cookie header for the backend origin.
pub const COOKIES_KEY: &str = "cookies";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage key {0:?} is not a plain name")]
    InvalidKey(String),

    #[error("storage io for {key:?} failed: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// String values under string keys.
pub trait DurableStore: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_key(key) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DurableStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_owned(), source }),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io { key: key.to_owned(), source };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        // Unique temp file, then rename: no truncated snapshot, no clash between processes.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(StorageError::Io { key: key.to_owned(), source: e }),
            _ => Ok(()),
        }
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl DurableStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// =============================================================================
// JSON HELPERS
// =============================================================================

/// Load a JSON value for `key`.
///
/// A value that no longer deserializes is removed and reported as absent.
pub fn load_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(raw) => raw?,
        Err(error) => {
            tracing::warn!(%key, %error, "durable load failed");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(%key, %error, "discarding corrupt durable value");
            remove_key(store, key);
            None
        }
    }
}

/// Save a JSON value for `key`, logging failures.
pub fn save_json<T: Serialize>(store: &dyn DurableStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(%key, %error, "durable value not serializable");
            return;
        }
    };
    if let Err(error) = store.save(key, &raw) {
        tracing::warn!(%key, %error, "durable save failed");
    }
}

/// Remove `key`, logging failures.
pub fn remove_key(store: &dyn DurableStore, key: &str) {
    if let Err(error) = store.remove(key) {
        tracing::warn!(%key, %error, "durable remove failed");
    }
}
