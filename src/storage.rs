//! Persistent key/value storage for visitor preferences.
//!
//! The page keeps a single key (the language preference). In the browser
//! this is `localStorage`; natively it is either a plain map or a JSON file.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused access (private browsing, disabled storage, quota)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to access preference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preference file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value preference storage.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store that counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes += 1;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences persisted as a JSON object in a file.
///
/// The file is read once when the store is opened and rewritten on every `set`.
/// A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preference file at {}, starting empty", path.display());
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .values
            .get(key)
            .and_then(Value::as_str)
            .map(String::from))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}
