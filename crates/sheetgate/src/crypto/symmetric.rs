// Symmetric encryption — XChaCha20-Poly1305 with the nonce carried in
// a separate `iv` field, matching the stored `{data, iv}` envelope.
// Constant-time buffer comparison.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305, XNonce,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use sheetgate_core::error::GateError;

/// Ciphertext plus nonce, both base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub data: String,
    pub iv: String,
}

/// Encrypt a plaintext under a 32-byte key with a random 24-byte nonce.
pub fn encrypt(key: &[u8; 32], plaintext: &str) -> Result<EncryptedPayload, GateError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| GateError::crypto(format!("cipher init failed: {e}")))?;

    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| GateError::crypto(format!("encryption failed: {e}")))?;

    Ok(EncryptedPayload {
        data: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(nonce),
    })
}

/// Decrypt a payload produced by `encrypt`.
pub fn decrypt(key: &[u8; 32], payload: &EncryptedPayload) -> Result<String, GateError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let nonce_bytes = STANDARD
        .decode(&payload.iv)
        .map_err(|e| GateError::crypto(format!("invalid nonce encoding: {e}")))?;
    if nonce_bytes.len() != 24 {
        return Err(GateError::crypto("nonce must be 24 bytes"));
    }
    let ciphertext = STANDARD
        .decode(&payload.data)
        .map_err(|e| GateError::crypto(format!("invalid ciphertext encoding: {e}")))?;

    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| GateError::crypto(format!("cipher init failed: {e}")))?;

    let nonce = XNonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|e| GateError::crypto(format!("decryption failed: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| GateError::crypto(format!("invalid plaintext: {e}")))
}

/// Compare two byte slices in constant time.
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [42u8; 32];

    #[test]
    fn test_encrypt_decrypt() {
        let payload = encrypt(&KEY, "hello token").unwrap();
        assert_ne!(payload.data, "hello token");
        assert_eq!(decrypt(&KEY, &payload).unwrap(), "hello token");
    }

    #[test]
    fn test_wrong_key_fails() {
        let payload = encrypt(&KEY, "secret").unwrap();
        let wrong = [0u8; 32];
        assert!(decrypt(&wrong, &payload).is_err());
    }

    #[test]
    fn test_nonces_differ() {
        let a = encrypt(&KEY, "same").unwrap();
        let b = encrypt(&KEY, "same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.data, b.data);
        assert_eq!(decrypt(&KEY, &a).unwrap(), "same");
        assert_eq!(decrypt(&KEY, &b).unwrap(), "same");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut payload = encrypt(&KEY, "secret").unwrap();
        payload.data = payload.data.replacen(
            payload.data.chars().next().unwrap(),
            if payload.data.starts_with('A') { "B" } else { "A" },
            1,
        );
        assert!(decrypt(&KEY, &payload).is_err());
    }

    #[test]
    fn test_garbage_nonce_rejected() {
        let payload = EncryptedPayload {
            data: "AAAA".into(),
            iv: "short".into(),
        };
        assert!(decrypt(&KEY, &payload).is_err());
    }

    #[test]
    fn test_constant_time_equal() {
        assert!(constant_time_equal(b"abc", b"abc"));
        assert!(!constant_time_equal(b"abc", b"abd"));
        assert!(!constant_time_equal(b"abc", b"ab"));
    }
}
