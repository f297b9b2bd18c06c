//! Stable article fingerprints used as the deduplication key.

use sha2::{Digest, Sha256};

/// SHA-256 of `url + "::" + title`, as 64 lowercase hex characters.
pub fn fingerprint(url: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"::");
    hasher.update(title.as_bytes());
    format!("{:x}", hasher.finalize())
}
