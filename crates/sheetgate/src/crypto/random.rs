// Opaque token generation.

use rand::Rng;

/// Character set: a-z, A-Z, 0-9, -, _
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Default length of locally minted gate tokens.
pub const TOKEN_LEN: usize = 32;

/// Generate a random token of the specified length.
pub fn generate_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
