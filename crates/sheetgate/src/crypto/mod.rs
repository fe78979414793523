// Crypto module — credential hashing, symmetric encryption, key
// provision, random token generation.

pub mod hasher;
pub mod key;
pub mod random;
pub mod symmetric;

pub use hasher::{generate_hash, validate_hash_format, verify_against_hash};
pub use key::{EphemeralKeyProvider, FixedKeyProvider, KeyProvider};
pub use random::generate_token;
pub use symmetric::{constant_time_equal, decrypt, encrypt, EncryptedPayload};
