//! # Durable Client Storage
//!
//! A flat string key/value store that survives restarts. The chat session only
//! ever touches one key ([`IDENTITY_KEY`]), but the store doesn't know that.
//!
//! `FileStorage` keeps a single JSON object on disk and writes it atomically
//! (write `.tmp`, then `rename()`). There's no locking: two processes writing
//! the same file race, and the last write wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};

use crate::core::error::ChatError;

/// Storage key holding the active conversation identity.
pub const IDENTITY_KEY: &str = "uuid";

pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, ChatError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), ChatError>;
}

/// Returns `~/.chatwire/storage.json`.
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatwire").join("storage.json"))
}

/// JSON-file backed storage.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty store.
    fn load(&self) -> Result<HashMap<String, String>, ChatError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|e| ChatError::Storage(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| {
            warn!("Storage file {} is not valid JSON: {}", self.path.display(), e);
            ChatError::Storage(e.to_string())
        })
    }

    fn save(&self, items: &HashMap<String, String>) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ChatError::Storage(e.to_string()))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let json =
            serde_json::to_string_pretty(items).map_err(|e| ChatError::Storage(e.to_string()))?;
        fs::write(&tmp_path, json).map_err(|e| ChatError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut items = self.load().unwrap_or_default();
        items.insert(key.to_string(), value.to_string());
        self.save(&items)?;
        debug!("Stored {} in {}", key, self.path.display());
        Ok(())
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ChatError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
