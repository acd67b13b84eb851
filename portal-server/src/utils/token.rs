// portal-server/src/utils/token.rs
use sha2::{Digest, Sha256};

/// Hash a string using SHA-256, hex encoded
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registry key for a backend session cookie value.
///
/// The value is hashed as given; callers normalise it once so the key and
/// the cookie forwarded to the backend always agree.
pub fn fingerprint(cookie_value: &str) -> String {
    hash_string(cookie_value)
}
