//! Content hashing for filter sources
//!
//! Uses xxHash64 to fingerprint the raw bytes of a filter list. The digest is
//! only used to detect "has this list changed since the last compile", so a
//! fast non-cryptographic hash is enough.

use std::hash::Hasher;

use twox_hash::XxHash64;

const CONTENT_SEED: u64 = 0x9e37_79b9_7f4a_7c15; // Golden ratio

/// Compute the raw 64-bit digest of `data`.
#[inline]
pub fn hash64(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(CONTENT_SEED);
    hasher.write(data);
    hasher.finish()
}

/// Hash a source's bytes into the hex form stored alongside compiled rules.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:016x}", hash64(data))
}
