//! Binary Merkle tree over a power-of-two number of leaves, with compact
//! per-leaf inclusion paths.
//!
//! The producer guarantees the power-of-two shape by sealing batches at
//! `threshold` measurements and adding the batch-metadata leaf, so the
//! engine never needs a duplicated-last-node rule and verification is
//! unambiguous.

use std::collections::BTreeMap;

use fogseal_basic_types::LeafId;
use fogseal_crypto::hash_concat;
use serde::{Deserialize, Serialize};

/// Compact inclusion proof for one leaf.
///
/// `dir` and `hash` have the same length; `dir[i] == '0'` means the
/// running hash was the left child at level `i` (sibling goes on the
/// right), `'1'` means it was the right child (sibling goes on the left).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactPath {
    pub dir: String,
    pub hash: Vec<String>,
}

impl CompactPath {
    fn push(&mut self, direction: char, sibling: &str) {
        self.dir.push(direction);
        self.hash.push(sibling.to_string());
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a tree without leaves")]
    NoLeaves,
    #[error("leaf count {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("id list length {ids} does not match leaf count {leaves}")]
    IdCountMismatch { ids: usize, leaves: usize },
}

/// A fully built tree: the root and one compact path per leaf id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: String,
    paths: BTreeMap<LeafId, CompactPath>,
}

impl MerkleTree {
    /// Builds the tree bottom-up by pairing adjacent siblings
    /// left-to-right. `leaves[i]` carries the logical id `ids[i]`; while
    /// folding, every id under the left child records `('0', right)` and
    /// every id under the right child records `('1', left)`.
    pub fn build(leaves: &[String], ids: &[LeafId]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::NoLeaves);
        }
        if !leaves.len().is_power_of_two() {
            return Err(MerkleError::NotPowerOfTwo(leaves.len()));
        }
        if ids.len() != leaves.len() {
            return Err(MerkleError::IdCountMismatch {
                ids: ids.len(),
                leaves: leaves.len(),
            });
        }

        let mut paths: BTreeMap<LeafId, CompactPath> =
            ids.iter().map(|id| (*id, CompactPath::default())).collect();
        let mut level: Vec<String> = leaves.to_vec();
        let mut groups: Vec<Vec<LeafId>> = ids.iter().map(|id| vec![*id]).collect();

        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len() / 2);
            let mut next_groups = Vec::with_capacity(groups.len() / 2);

            for i in (0..level.len()).step_by(2) {
                let (left, right) = (&level[i], &level[i + 1]);
                for id in &groups[i] {
                    paths.get_mut(id).expect("id seeded above").push('0', right);
                }
                for id in &groups[i + 1] {
                    paths.get_mut(id).expect("id seeded above").push('1', left);
                }

                next_level.push(hash_concat(left, right));
                let mut merged = groups[i].clone();
                merged.extend_from_slice(&groups[i + 1]);
                next_groups.push(merged);
            }

            level = next_level;
            groups = next_groups;
        }

        Ok(MerkleTree {
            root: level.remove(0),
            paths,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn paths(&self) -> &BTreeMap<LeafId, CompactPath> {
        &self.paths
    }

    pub fn into_parts(self) -> (String, BTreeMap<LeafId, CompactPath>) {
        (self.root, self.paths)
    }
}

/// Replays a compact path from a candidate leaf hash and compares the
/// result with the expected root.
///
/// A path whose `dir` and `hash` lengths disagree cannot prove anything
/// and fails verification outright.
pub fn verify_leaf(leaf_hash: &str, path: &CompactPath, expected_root: &str) -> bool {
    if path.dir.len() != path.hash.len() {
        return false;
    }
    let mut current = leaf_hash.to_string();
    for (direction, sibling) in path.dir.chars().zip(&path.hash) {
        current = match direction {
            '1' => hash_concat(sibling, &current),
            _ => hash_concat(&current, sibling),
        };
    }
    current == expected_root
}
