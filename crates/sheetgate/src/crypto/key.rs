// Key provision — the symmetric key used for token encryption is an
// injected capability, not a hidden singleton, so tests can supply a
// fixed key and verify round trips deterministically.

use rand::RngCore;

/// Supplies the 32-byte symmetric key for token encryption.
pub trait KeyProvider: Send + Sync + std::fmt::Debug {
    fn key(&self) -> &[u8; 32];
}

/// A fresh random key per construction. Tokens encrypted under one
/// provider instance cannot be read after the instance is gone; the
/// manager's plaintext fallback and lazy expiry handle that case.
pub struct EphemeralKeyProvider {
    key: [u8; 32],
}

impl EphemeralKeyProvider {
    pub fn new() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }
}

impl Default for EphemeralKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EphemeralKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EphemeralKeyProvider(..)")
    }
}

impl KeyProvider for EphemeralKeyProvider {
    fn key(&self) -> &[u8; 32] {
        &self.key
    }
}

/// A caller-supplied fixed key.
pub struct FixedKeyProvider {
    key: [u8; 32],
}

impl FixedKeyProvider {
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for FixedKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FixedKeyProvider(..)")
    }
}

impl KeyProvider for FixedKeyProvider {
    fn key(&self) -> &[u8; 32] {
        &self.key
    }
}
