// Token manager — single-slot-per-gate encrypted token persistence
// with lazy expiry.
//
// Stored value is a JSON envelope `{data, iv, timestamp}` wrapping the
// encrypted session. When encryption is unavailable the session is
// stored as plain JSON instead: availability wins over confidentiality
// in that path, and the degraded write is logged as a warning.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sheetgate_core::error::GateError;
use sheetgate_core::logger::GateLogger;
use sheetgate_core::storage::TokenStore;

use crate::crypto::key::KeyProvider;
use crate::crypto::symmetric::{self, EncryptedPayload};

const KEY_PREFIX: &str = "sheetgate:token:";

/// An issued authorization, scoped to one gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub gate_id: String,
}

/// The on-disk/on-store envelope around an encrypted session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEnvelope {
    data: String,
    iv: String,
    timestamp: i64,
}

/// Per-gate single-slot token storage.
///
/// Exactly one session exists per gate id; storing again overwrites.
/// Expired or unreadable entries are deleted when read, not by a
/// background sweep.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    keys: Arc<dyn KeyProvider>,
    logger: GateLogger,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("store", &self.store)
            .field("keys", &self.keys)
            .finish()
    }
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, keys: Arc<dyn KeyProvider>) -> Self {
        Self {
            store,
            keys,
            logger: GateLogger::default(),
        }
    }

    pub fn with_logger(mut self, logger: GateLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Persist a token for a gate. `expires_at` must be strictly in the
    /// future.
    pub async fn store_token(
        &self,
        gate_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), GateError> {
        if gate_id.is_empty() || token.is_empty() {
            return Err(GateError::invalid_argument(
                "gateId and token must not be empty",
            ));
        }
        let now = Utc::now();
        if expires_at <= now {
            return Err(GateError::invalid_argument(
                "expiresAt must be in the future",
            ));
        }

        let session = AuthSession {
            token: token.to_string(),
            created_at: now.timestamp_millis(),
            expires_at: expires_at.timestamp_millis(),
            gate_id: gate_id.to_string(),
        };
        let plain = serde_json::to_string(&session)
            .map_err(|e| GateError::invalid_argument(format!("session serialization: {e}")))?;

        let value = match symmetric::encrypt(self.keys.key(), &plain) {
            Ok(EncryptedPayload { data, iv }) => {
                let envelope = StoredEnvelope {
                    data,
                    iv,
                    timestamp: now.timestamp_millis(),
                };
                serde_json::to_string(&envelope)
                    .map_err(|e| GateError::crypto(format!("envelope serialization: {e}")))?
            }
            Err(e) => {
                // Reduced-security mode: store the session unencrypted
                // rather than failing the whole flow.
                self.logger
                    .warn(&format!("storing token for {gate_id} unencrypted: {e}"));
                plain
            }
        };

        let ttl_ms = (expires_at - now).num_milliseconds().max(0) as f64;
        let ttl_secs = (ttl_ms / 1000.0).ceil() as u64;
        self.store
            .set(&storage_key(gate_id), &value, Some(ttl_secs))
            .await
            .map_err(|e| GateError::with_message(sheetgate_core::ErrorCode::StorageFailure, e.to_string()))
    }

    /// Read the token for a gate. Absent, unreadable, or expired slots
    /// are cleared and yield `None` — never an error.
    pub async fn get_token(&self, gate_id: &str) -> Option<String> {
        let key = storage_key(gate_id);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.logger.warn(&format!("token read failed: {e}"));
                return None;
            }
        };

        let session = match self.decode(&raw) {
            Some(session) => session,
            None => {
                self.clear_token(gate_id).await;
                return None;
            }
        };

        if session.expires_at <= Utc::now().timestamp_millis() {
            self.clear_token(gate_id).await;
            return None;
        }
        Some(session.token)
    }

    /// Whether a live token exists for a gate.
    pub async fn is_token_valid(&self, gate_id: &str) -> bool {
        self.get_token(gate_id).await.is_some()
    }

    /// Remove the slot for one gate. Removing an empty slot is fine.
    pub async fn clear_token(&self, gate_id: &str) {
        if let Err(e) = self.store.delete(&storage_key(gate_id)).await {
            self.logger.warn(&format!("token clear failed: {e}"));
        }
    }

    /// Remove every stored token.
    pub async fn clear_all_tokens(&self) {
        if let Err(e) = self.store.delete_prefix(KEY_PREFIX).await {
            self.logger.warn(&format!("token clear-all failed: {e}"));
        }
    }

    /// Decode a stored value: an encrypted envelope, or the plaintext
    /// fallback written when encryption was unavailable.
    fn decode(&self, raw: &str) -> Option<AuthSession> {
        if let Ok(envelope) = serde_json::from_str::<StoredEnvelope>(raw) {
            let payload = EncryptedPayload {
                data: envelope.data,
                iv: envelope.iv,
            };
            let plain = symmetric::decrypt(self.keys.key(), &payload).ok()?;
            return serde_json::from_str(&plain).ok();
        }
        serde_json::from_str(raw).ok()
    }
}

fn storage_key(gate_id: &str) -> String {
    format!("{KEY_PREFIX}{gate_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::FixedKeyProvider;
    use chrono::TimeDelta;
    use sheetgate_core::storage::MemoryTokenStore;

    fn manager_with(store: Arc<MemoryTokenStore>) -> TokenManager {
        TokenManager::new(store, Arc::new(FixedKeyProvider::from_bytes([9u8; 32])))
            .with_logger(GateLogger::silent())
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store.clone());
        let expires = Utc::now() + TimeDelta::minutes(10);

        manager.store_token("members", "tok-1", expires).await.unwrap();
        assert_eq!(manager.get_token("members").await, Some("tok-1".into()));
        assert!(manager.is_token_valid("members").await);

        // Stored value is not the bare token.
        let raw = store.get("sheetgate:token:members").await.unwrap().unwrap();
        assert!(!raw.contains("tok-1"));
    }

    #[tokio::test]
    async fn test_past_expiry_rejected() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store);
        let expires = Utc::now() - TimeDelta::seconds(1);

        let err = manager.store_token("members", "tok", expires).await.unwrap_err();
        assert_eq!(err.code, sheetgate_core::ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_overwrite_single_slot() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store);
        let expires = Utc::now() + TimeDelta::minutes(10);

        manager.store_token("members", "old", expires).await.unwrap();
        manager.store_token("members", "new", expires).await.unwrap();
        assert_eq!(manager.get_token("members").await, Some("new".into()));
    }

    #[tokio::test]
    async fn test_lazy_expiry_clears_slot() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store.clone());
        let expires = Utc::now() + TimeDelta::milliseconds(40);

        manager.store_token("members", "tok", expires).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        assert_eq!(manager.get_token("members").await, None);
        // The slot itself was deleted, not just masked.
        assert_eq!(store.get("sheetgate:token:members").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_token_idempotent() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store);
        manager.clear_token("never-stored").await;
        let expires = Utc::now() + TimeDelta::minutes(10);
        manager.store_token("members", "tok", expires).await.unwrap();
        manager.clear_token("members").await;
        manager.clear_token("members").await;
        assert!(!manager.is_token_valid("members").await);
    }

    #[tokio::test]
    async fn test_clear_all_tokens() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store);
        let expires = Utc::now() + TimeDelta::minutes(10);
        manager.store_token("a", "t1", expires).await.unwrap();
        manager.store_token("b", "t2", expires).await.unwrap();

        manager.clear_all_tokens().await;
        assert!(!manager.is_token_valid("a").await);
        assert!(!manager.is_token_valid("b").await);
    }

    #[tokio::test]
    async fn test_plaintext_fallback_readback() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store.clone());

        // Simulate a degraded write: the session stored as plain JSON.
        let session = AuthSession {
            token: "plain-tok".into(),
            created_at: Utc::now().timestamp_millis(),
            expires_at: (Utc::now() + TimeDelta::minutes(5)).timestamp_millis(),
            gate_id: "members".into(),
        };
        let raw = serde_json::to_string(&session).unwrap();
        store
            .set("sheetgate:token:members", &raw, Some(300))
            .await
            .unwrap();

        assert_eq!(manager.get_token("members").await, Some("plain-tok".into()));
    }

    #[tokio::test]
    async fn test_undecryptable_slot_cleared() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = manager_with(store.clone());

        let garbage = r#"{"data":"AAAA","iv":"BBBB","timestamp":0}"#;
        store
            .set("sheetgate:token:members", garbage, None)
            .await
            .unwrap();

        assert_eq!(manager.get_token("members").await, None);
        assert_eq!(store.get("sheetgate:token:members").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_key_rotation_invalidates() {
        let store = Arc::new(MemoryTokenStore::new());
        let writer = manager_with(store.clone());
        let expires = Utc::now() + TimeDelta::minutes(10);
        writer.store_token("members", "tok", expires).await.unwrap();

        // A manager with a different key cannot read the slot.
        let reader = TokenManager::new(
            store,
            Arc::new(FixedKeyProvider::from_bytes([1u8; 32])),
        )
        .with_logger(GateLogger::silent());
        assert_eq!(reader.get_token("members").await, None);
    }
}
