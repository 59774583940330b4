//! Canonical hashing helpers for stable fingerprints.
//!
//! Provides canonical encodings for the fields that make up a report
//! fingerprint.

use sha2::{Digest, Sha256};

/// Hashes a byte field with an explicit length prefix.
///
/// Length-prefixing avoids delimiter ambiguities (for example embedded `|` or
/// newlines in file names) that can otherwise make distinct data serialize to
/// identical byte streams before hashing.
pub(crate) fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    hasher.update(len.to_be_bytes());
    hasher.update(bytes);
}

/// Hashes a string field as its UTF-8 bytes.
pub(crate) fn hash_str_field(hasher: &mut Sha256, value: &str) {
    hash_field(hasher, value.as_bytes());
}
