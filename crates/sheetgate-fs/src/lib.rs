// sheetgate-fs — durable-local token storage.
//
// A `TokenStore` backed by a single JSON file, for embedders that want
// issued tokens to survive a process restart. Expiry is tracked as an
// absolute wall-clock timestamp so it holds across restarts too.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use sheetgate_core::storage::{TokenStore, TokenStoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
}

/// A file-backed token store.
///
/// Every operation loads, mutates, and rewrites the whole file; the
/// store holds a handful of token slots, so simplicity wins over
/// incremental IO.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, FileEntry>, TokenStoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| TokenStoreError::OperationFailed(format!("read {:?}: {e}", self.path)))?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| TokenStoreError::OperationFailed(format!("parse {:?}: {e}", self.path)))
    }

    fn persist(&self, entries: &HashMap<String, FileEntry>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TokenStoreError::OperationFailed(format!("create {parent:?}: {e}"))
                })?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| TokenStoreError::OperationFailed(format!("serialize: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| TokenStoreError::OperationFailed(format!("write {:?}: {e}", self.path)))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        match entries.get(key) {
            Some(entry) => {
                if let Some(expires_at_ms) = entry.expires_at_ms {
                    if Utc::now().timestamp_millis() >= expires_at_ms {
                        entries.remove(key);
                        self.persist(&entries)?;
                        return Ok(None);
                    }
                }
                Ok(Some(entry.value.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        let expires_at_ms = ttl.map(|secs| Utc::now().timestamp_millis() + (secs as i64) * 1000);
        entries.insert(
            key.to_string(),
            FileEntry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        self.persist(&entries)
    }

    async fn delete(&self, key: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        if entries.len() != before {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
