//! Request-identity key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a request.
///
/// Only GET requests are ever cached, but the method participates in the
/// key so the identity stays method + URL as recorded.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
