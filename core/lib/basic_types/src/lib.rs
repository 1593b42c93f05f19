//! Primitive types shared by every fogseal actor (producer, cloud, verifier).

use std::{fmt, num::ParseIntError, ops::Add, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod roles;

/// Identifier of a measurement batch, assigned by the producer's local store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BatchNumber(pub i64);

impl BatchNumber {
    /// Returns the next batch number.
    pub fn next(self) -> BatchNumber {
        BatchNumber(self.0 + 1)
    }
}

impl fmt::Display for BatchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BatchNumber {
    fn from(value: i64) -> Self {
        BatchNumber(value)
    }
}

impl Add<i64> for BatchNumber {
    type Output = BatchNumber;

    fn add(self, rhs: i64) -> BatchNumber {
        BatchNumber(self.0 + rhs)
    }
}

impl FromStr for BatchNumber {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(BatchNumber)
    }
}

/// Logical id of a Merkle leaf. Id 0 is reserved for the batch leaf;
/// measurement leaves use their (strictly positive) measurement id.
pub type LeafId = u64;

/// The reserved leaf id of the batch-metadata leaf.
pub const BATCH_LEAF_ID: LeafId = 0;

/// Unrecoverable pipeline failure classes, persisted verbatim in the
/// `error_kind` column of a non-elaborable batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Merkle tree construction failed.
    #[serde(rename = "MERKLE_INVALID")]
    MerkleInvalid,
    /// Payload construction or canonical serialization failed.
    #[serde(rename = "PAYLOAD_INVALID")]
    PayloadInvalid,
    /// Object-store upload or CID retrieval failed.
    #[serde(rename = "IPFS")]
    Ipfs,
    /// Anchoring the root to the immutable store failed.
    #[serde(rename = "BLOCKCHAIN")]
    Blockchain,
    /// Transient outbound HTTP failure. Never persisted on a batch;
    /// the owning worker retries on its next tick.
    #[serde(rename = "HTTP")]
    Http,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MerkleInvalid => "MERKLE_INVALID",
            ErrorKind::PayloadInvalid => "PAYLOAD_INVALID",
            ErrorKind::Ipfs => "IPFS",
            ErrorKind::Blockchain => "BLOCKCHAIN",
            ErrorKind::Http => "HTTP",
        }
    }

    /// Kinds that flip `elaborable` to false when recorded on a batch.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorKind::Http)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown error kind: {0}")]
pub struct ParseErrorKindError(String);

impl FromStr for ErrorKind {
    type Err = ParseErrorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MERKLE_INVALID" => Ok(ErrorKind::MerkleInvalid),
            "PAYLOAD_INVALID" => Ok(ErrorKind::PayloadInvalid),
            "IPFS" => Ok(ErrorKind::Ipfs),
            "BLOCKCHAIN" => Ok(ErrorKind::Blockchain),
            "HTTP" => Ok(ErrorKind::Http),
            other => Err(ParseErrorKindError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_round_trips_through_str() {
        for kind in [
            ErrorKind::MerkleInvalid,
            ErrorKind::PayloadInvalid,
            ErrorKind::Ipfs,
            ErrorKind::Blockchain,
            ErrorKind::Http,
        ] {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), kind);
        }
        assert!("TIMEOUT".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn only_http_is_transient() {
        assert!(!ErrorKind::Http.is_fatal());
        assert!(ErrorKind::Ipfs.is_fatal());
        assert!(ErrorKind::Blockchain.is_fatal());
    }

    #[test]
    fn batch_number_is_transparent_in_json() {
        let number: BatchNumber = serde_json::from_str("42").unwrap();
        assert_eq!(number, BatchNumber(42));
        assert_eq!(serde_json::to_string(&number).unwrap(), "42");
    }
}
