use std::time::Duration;

use serde::Deserialize;

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_gzip() -> bool {
    false
}

/// Credentials and addressing for the content-addressed object store
/// (an S3-compatible endpoint fronting IPFS, e.g. Filebase).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ObjectStoreConfig {
    /// S3-compatible upload endpoint, e.g. `https://s3.filebase.com`.
    pub endpoint_url: String,

    /// Content-addressed gateway for downloads, e.g.
    /// `https://ipfs.filebase.io`.
    pub gateway_url: String,

    /// Bucket holding the Merkle path blobs.
    pub bucket: String,

    pub access_key: String,
    pub secret_key: String,

    /// Whether to gzip path blobs before upload.
    #[serde(default = "default_gzip")]
    pub gzip: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ObjectStoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            endpoint_url: "http://localhost:9000".to_string(),
            gateway_url: "http://localhost:9001".to_string(),
            bucket: "merkle-path-batch".to_string(),
            access_key: "test-access".to_string(),
            secret_key: "test-secret".to_string(),
            gzip: false,
            request_timeout_secs: 10,
        }
    }
}
