use std::time::Duration;

use serde::Deserialize;

fn default_request_timeout_secs() -> u64 {
    10
}

/// Reachability of the cloud ingest service, as seen by the producer.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CloudConfig {
    /// Base URL of the cloud service, e.g. `http://localhost:8080`.
    pub base_url: String,

    /// Producer API key sent as `X-API-Key`.
    pub api_key: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl CloudConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: "test-producer-key".to_string(),
            request_timeout_secs: 10,
        }
    }
}
