use std::time::Duration;

use serde::Deserialize;

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VerifierConfig {
    /// Base URL of the cloud service.
    pub cloud_base_url: String,

    /// Verifier API key sent as `X-API-Key`.
    pub api_key: String,

    /// Content-addressed gateway serving the Merkle path blobs.
    pub gateway_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl VerifierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            cloud_base_url: "http://localhost:8080".to_string(),
            api_key: "test-verifier-key".to_string(),
            gateway_url: "http://localhost:9001".to_string(),
            request_timeout_secs: 10,
        }
    }
}
