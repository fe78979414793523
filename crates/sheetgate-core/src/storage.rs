// Token storage trait — an abstract key-value store with TTL support
// backing the gate's single-slot-per-gate token persistence.
//
// Backends: in-memory (here), durable file-backed (sheetgate-fs crate).

use async_trait::async_trait;

/// A key-value storage backend for issued tokens.
///
/// Implementations should support TTL-based expiration; a `get` after
/// the TTL elapses must behave as if the key were never written.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Get a value by key. Returns `None` if the key doesn't exist or
    /// has expired.
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;

    /// Set a key-value pair with an optional TTL in seconds.
    /// If `ttl` is `None`, the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), TokenStoreError>;

    /// Delete a key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), TokenStoreError>;

    /// Delete every key starting with `prefix`. Used for scoped
    /// clear-all; the trait keeps it coarse so backends without key
    /// iteration can still implement it.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), TokenStoreError>;
}

/// Errors from token storage operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Token storage operation failed: {0}")]
    OperationFailed(String),
}

/// An in-memory token store backed by a HashMap with TTL.
///
/// Covers the in-memory and session-scoped storage modes: entries live
/// for the lifetime of the process (or until their TTL elapses).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    store: std::sync::Mutex<std::collections::HashMap<String, MemoryEntry>>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<std::time::Instant>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = store.get(key) {
            if let Some(expires_at) = entry.expires_at {
                if std::time::Instant::now() >= expires_at {
                    store.remove(key);
                    return Ok(None);
                }
            }
            Ok(Some(entry.value.clone()))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), TokenStoreError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let expires_at =
            ttl.map(|secs| std::time::Instant::now() + std::time::Duration::from_secs(secs));
        store.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), TokenStoreError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}
