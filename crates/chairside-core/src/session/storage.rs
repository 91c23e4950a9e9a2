//! Durable session-state storage backends
//!
//! The session blob lives under a fixed key, one JSON file per key. A
//! malformed or unreadable blob is treated as absent, so rehydration
//! fails open to the anonymous state instead of propagating the error.

use super::SessionState;
use crate::error::{ChairsideError, ChairsideResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Durable storage for session state
pub trait StateStorage: Send + Sync {
    /// Persist the state under `key`, replacing any previous blob
    fn store(&self, key: &str, state: &SessionState) -> ChairsideResult<()>;

    /// Read the state stored under `key`.
    ///
    /// Absent, unreadable, or malformed blobs all come back as `None`.
    fn retrieve(&self, key: &str) -> Option<SessionState>;

    /// Remove any blob stored under `key`
    fn clear(&self, key: &str) -> ChairsideResult<()>;
}

/// File-based storage, one `<key>.json` per key under a base directory
pub struct FileStateStorage {
    base_dir: PathBuf,
}

impl FileStateStorage {
    /// Create the storage, making sure the base directory exists
    pub fn new(base_dir: impl Into<PathBuf>) -> ChairsideResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            ChairsideError::storage(format!(
                "Failed to create storage directory {}: {e}",
                base_dir.display()
            ))
        })?;
        Ok(Self { base_dir })
    }

    /// Directory holding the blobs
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStateStorage {
    fn store(&self, key: &str, state: &SessionState) -> ChairsideResult<()> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| ChairsideError::storage(format!("Failed to serialize state: {e}")))?;
        std::fs::write(self.blob_path(key), content)
            .map_err(|e| ChairsideError::storage(format!("Failed to write state blob: {e}")))?;
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Option<SessionState> {
        let path = self.blob_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return None,
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed session blob, treating as absent");
                None
            }
        }
    }

    fn clear(&self, key: &str) -> ChairsideResult<()> {
        let path = self.blob_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| ChairsideError::storage(format!("Failed to remove state blob: {e}")))?;
        }
        Ok(())
    }
}

/// In-memory storage for tests.
///
/// Blobs round-trip through serialized JSON so the persistence path is
/// exercised the same way the file backend exercises it.
#[derive(Default)]
pub struct MemoryStateStorage {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStateStorage {
    /// Create an empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a raw blob, bypassing serialization. Lets tests stage
    /// malformed or legacy content.
    pub fn put_raw(&self, key: &str, content: impl Into<String>) {
        self.blobs.write().insert(key.to_string(), content.into());
    }

    /// Raw blob stored under `key`, if any
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.read().get(key).cloned()
    }
}

impl StateStorage for MemoryStateStorage {
    fn store(&self, key: &str, state: &SessionState) -> ChairsideResult<()> {
        let content = serde_json::to_string(state)
            .map_err(|e| ChairsideError::storage(format!("Failed to serialize state: {e}")))?;
        self.blobs.write().insert(key.to_string(), content);
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Option<SessionState> {
        let content = self.blobs.read().get(key).cloned()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(key, error = %e, "malformed session blob, treating as absent");
                None
            }
        }
    }

    fn clear(&self, key: &str) -> ChairsideResult<()> {
        self.blobs.write().remove(key);
        Ok(())
    }
}
