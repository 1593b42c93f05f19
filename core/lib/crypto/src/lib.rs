//! The two hash primitives and the canonical JSON form every other layer
//! reduces to.
//!
//! Leaf and node hashes across the whole pipeline are lowercase-hex
//! SHA-256 digests. Inner nodes hash the *concatenated hex strings* of
//! their children, not the raw digest bytes, so the producer, the cloud
//! and the verifier can all recompute the tree from string material
//! alone.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the given bytes, as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parent hash of two child hashes: `H(left || right)` over the hex
/// representations.
pub fn hash_concat(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Serializes a value into its canonical JSON form: keys sorted
/// lexicographically at every nesting level, `,`/`:` separators, no
/// whitespace.
///
/// The value is round-tripped through `serde_json::Value`, whose object
/// representation is a `BTreeMap` (the `preserve_order` feature must stay
/// off), so struct fields end up sorted regardless of declaration order.
/// This is the only JSON form that may ever be hashed; pretty-printed
/// variants are for logs.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&value)
}

/// Hash of a value's canonical JSON form.
pub fn canonical_hash<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}
