//! Key-value persistence for whole JSON blobs, in the manner of browser `localStorage`.
//!
//! Writes are synchronous and last write wins. Reads that fail for any reason fall back to defaults in [`load_or_default`].

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PersistenceError;

/// Key of the [`GameStats`](crate::GameStats) blob.
pub const STATS_KEY: &str = "circuitry.stats";
/// Key of the [`Settings`](crate::Settings) blob.
pub const SETTINGS_KEY: &str = "circuitry.settings";
/// Key of the [`Achievements`](crate::Achievements) blob.
pub const ACHIEVEMENTS_KEY: &str = "circuitry.achievements";

/// A string key-value store.
pub trait Storage {
    /// Read the blob under `key`, or `None` if nothing was ever written there.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    /// Replace the blob under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    /// Delete the blob under `key`; deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Storage that lives and dies with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory, created on first write.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Use the directory named by `CIRCUITRY_DATA_DIR`, or `.circuitry` in the working directory.
    pub fn from_env() -> Self {
        let dir = env::var("CIRCUITRY_DATA_DIR").unwrap_or_else(|_| ".circuitry".to_string());
        Self::new(dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Read and parse the blob under `key`.
pub fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>, PersistenceError> {
    storage
        .read(key)?
        .map(|text| {
            serde_json::from_str(&text).map_err(|source| PersistenceError::Parse { key: key.to_owned(), source })
        })
        .transpose()
}

/// Like [`load`], but anything missing, unreadable or corrupt comes back as `T::default()`.
pub fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match load(storage, key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(key, "nothing stored yet, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(key, error = %e, "could not load stored state, using defaults");
            T::default()
        }
    }
}

/// Serialize `value` and replace the blob under `key` with it.
pub fn store<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> Result<(), PersistenceError> {
    let text = serde_json::to_string(value)
        .map_err(|source| PersistenceError::Serialize { key: key.to_owned(), source })?;
    storage.write(key, &text)
}
