//! Content hashing for sync operations.
//!
//! SHA256 over the raw file bytes. The hex digest is what gets stored in
//! the sync state and compared against the remote file hash.

use sha2::{Digest, Sha256};

/// Compute the SHA256 hex digest of a byte slice.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Compare a local digest with one reported by the remote service.
///
/// Hex case is ignored. An empty remote hash never matches.
#[must_use]
pub fn matches_remote(local_hash: &str, remote_hash: &str) -> bool {
    let remote_hash = remote_hash.trim();
    !remote_hash.is_empty() && local_hash.eq_ignore_ascii_case(remote_hash)
}
