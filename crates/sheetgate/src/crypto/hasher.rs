// Credential hashing — PBKDF2-HMAC-SHA256 with a formatted hash string.
//
// Output format: "PBKDF2$<iterations>$<saltB64>$<hashB64>".
//
// The default salt is a digest of the gate id, so the same gate always
// yields the same salt and a verifier needs no stored salt. That is a
// deliberate statelessness tradeoff; `SaltMode::Random` embeds a
// random salt in the hash string instead.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};

use sheetgate_core::error::GateError;
use sheetgate_core::options::SaltMode;

pub const ALGORITHM: &str = "PBKDF2";
pub const ITERATIONS: u32 = 100_000;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hash a password for a gate, using the deterministic per-gate salt.
pub fn generate_hash(password: &str, gate_id: &str) -> Result<String, GateError> {
    generate_hash_with_mode(password, gate_id, SaltMode::Deterministic)
}

/// Hash a password for a gate with an explicit salt mode.
pub fn generate_hash_with_mode(
    password: &str,
    gate_id: &str,
    mode: SaltMode,
) -> Result<String, GateError> {
    if password.is_empty() {
        return Err(GateError::invalid_argument("password must not be empty"));
    }
    if gate_id.is_empty() {
        return Err(GateError::invalid_argument("gateId must not be empty"));
    }

    let salt = match mode {
        SaltMode::Deterministic => derive_salt(gate_id),
        SaltMode::Random => {
            let mut salt = [0u8; SALT_LEN];
            rand::thread_rng().fill_bytes(&mut salt);
            salt
        }
    };

    let key = derive_key(password, &salt, ITERATIONS);
    Ok(format!(
        "{ALGORITHM}${ITERATIONS}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(key)
    ))
}

/// Structural check of a hash string: four `$`-delimited parts, the
/// algorithm name, a numeric iteration count, and valid base64 salt and
/// hash. Does not verify the hash against any password.
pub fn validate_hash_format(hash: &str) -> bool {
    let parts: Vec<&str> = hash.split('$').collect();
    if parts.len() != 4 {
        return false;
    }
    parts[0] == ALGORITHM
        && parts[1].parse::<u32>().is_ok()
        && STANDARD.decode(parts[2]).is_ok()
        && STANDARD.decode(parts[3]).is_ok()
}

/// Verify a password against a hash string produced by `generate_hash`.
///
/// Re-derives the key with the salt and iteration count embedded in the
/// hash, so it works for both salt modes.
pub fn verify_against_hash(password: &str, hash: &str) -> Result<bool, GateError> {
    let parts: Vec<&str> = hash.split('$').collect();
    if parts.len() != 4 || parts[0] != ALGORITHM {
        return Err(GateError::invalid_argument("malformed hash string"));
    }
    let iterations: u32 = parts[1]
        .parse()
        .map_err(|_| GateError::invalid_argument("malformed iteration count"))?;
    let salt = STANDARD
        .decode(parts[2])
        .map_err(|_| GateError::invalid_argument("malformed salt encoding"))?;
    let expected = STANDARD
        .decode(parts[3])
        .map_err(|_| GateError::invalid_argument("malformed hash encoding"))?;

    let derived = derive_key(password, &salt, iterations);
    Ok(super::symmetric::constant_time_equal(&derived, &expected))
}

/// Compare a submitted password against a configured plaintext
/// candidate by hashing both under the gate's deterministic salt.
pub(crate) fn verify_local(
    submitted: &str,
    candidate: &str,
    gate_id: &str,
) -> Result<bool, GateError> {
    let a = generate_hash(submitted, gate_id)?;
    let b = generate_hash(candidate, gate_id)?;
    Ok(super::symmetric::constant_time_equal(
        a.as_bytes(),
        b.as_bytes(),
    ))
}

/// Deterministic salt: SHA-256 of the gate id, truncated to 16 bytes.
fn derive_salt(gate_id: &str) -> [u8; SALT_LEN] {
    let digest = Sha256::digest(gate_id.as_bytes());
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_per_gate() {
        let a = generate_hash("pw", "gateA").unwrap();
        let b = generate_hash("pw", "gateA").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_differs_between_gates() {
        let a = generate_hash("pw", "gateA").unwrap();
        let b = generate_hash("pw", "gateB").unwrap();
        assert_ne!(a, b);
        // The salt segment itself must differ, not just the key.
        let salt_a = a.split('$').nth(2).unwrap().to_string();
        let salt_b = b.split('$').nth(2).unwrap().to_string();
        assert_ne!(salt_a, salt_b);
    }

    #[test]
    fn test_hash_format() {
        let hash = generate_hash("pw", "gateA").unwrap();
        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "PBKDF2");
        assert_eq!(parts[1], "100000");
        assert_eq!(STANDARD.decode(parts[2]).unwrap().len(), 16);
        assert_eq!(STANDARD.decode(parts[3]).unwrap().len(), 32);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(generate_hash("", "gateA").is_err());
        assert!(generate_hash("pw", "").is_err());
    }

    #[test]
    fn test_validate_hash_format() {
        let hash = generate_hash("pw", "gateA").unwrap();
        assert!(validate_hash_format(&hash));

        // Tampered algorithm field.
        let tampered = hash.replacen("PBKDF2", "SCRYPT", 1);
        assert!(!validate_hash_format(&tampered));

        assert!(!validate_hash_format("PBKDF2$100000$onlythree"));
        assert!(!validate_hash_format("PBKDF2$abc$c2FsdA==$aGFzaA=="));
        assert!(!validate_hash_format("PBKDF2$100000$!!$aGFzaA=="));
    }

    #[test]
    fn test_verify_against_hash() {
        let hash = generate_hash("secret", "gateA").unwrap();
        assert!(verify_against_hash("secret", &hash).unwrap());
        assert!(!verify_against_hash("wrong", &hash).unwrap());
    }

    #[test]
    fn test_random_salt_mode() {
        let a = generate_hash_with_mode("pw", "gateA", SaltMode::Random).unwrap();
        let b = generate_hash_with_mode("pw", "gateA", SaltMode::Random).unwrap();
        assert_ne!(a, b);
        // Both still verify: the salt rides inside the hash string.
        assert!(verify_against_hash("pw", &a).unwrap());
        assert!(verify_against_hash("pw", &b).unwrap());
    }

    #[test]
    fn test_verify_local() {
        assert!(verify_local("pw", "pw", "gateA").unwrap());
        assert!(!verify_local("pw", "other", "gateA").unwrap());
    }
}
