//! Client for the content-addressed object store holding Merkle path
//! blobs.
//!
//! Uploads go to an S3-compatible endpoint that pins the content on a
//! content-addressed network and exposes the resulting CID in the object
//! metadata; downloads go through a public gateway by CID. The client is
//! a stateless per-call shim: concurrent calls are permitted.

use std::fmt;

use async_trait::async_trait;
use fogseal_crypto::sha256_hex;

pub use crate::{filebase::FilebaseStore, mock::MockObjectStore};

mod filebase;
mod gzip;
mod mock;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("upload of {key} failed with status {status}")]
    UploadRejected { key: String, status: u16 },
    #[error("no CID in the metadata of uploaded object {key}")]
    CidMissing { key: String },
    #[error("object {cid} not found on the gateway (status {status})")]
    FetchRejected { cid: String, status: u16 },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gzip error: {0}")]
    Gzip(#[from] std::io::Error),
}

/// A content-addressed object store: upload a JSON document, get a CID
/// back; fetch a document by CID.
#[async_trait]
pub trait ObjectStore: fmt::Debug + Send + Sync {
    /// Uploads `json` under `key` (gzip-compressed when asked) and
    /// returns the CID the store assigned to the content. Re-uploading
    /// identical content is benign: the store dedupes by content.
    async fn put_json(&self, key: &str, json: &str, gzip: bool)
        -> Result<String, ObjectStoreError>;

    /// Fetches a document by CID from the gateway, inflating it when the
    /// stored object is gzip-encoded.
    async fn fetch(&self, cid: &str) -> Result<String, ObjectStoreError>;
}

/// Derives the object key for a path blob from its content, so that
/// re-processing a batch re-uploads to the same key: `merkle_path_` plus
/// the first 8 hex chars of the content hash, `.json` (plus `.gz` when
/// compressed).
pub fn content_key(json: &str, gzip: bool) -> String {
    let short_hash = &sha256_hex(json.as_bytes())[..8];
    if gzip {
        format!("merkle_path_{short_hash}.json.gz")
    } else {
        format!("merkle_path_{short_hash}.json")
    }
}
