use std::collections::HashMap;

use anyhow::Context as _;
use fogseal_basic_types::roles::ApiUser;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CloudApiConfig {
    /// Bind address of the cloud HTTP API.
    pub bind_addr: String,

    /// Database URL of the cloud store.
    pub database_url: String,

    /// JSON map from API key to `{ "name": ..., "role": ... }`.
    pub api_keys: String,
}

impl CloudApiConfig {
    /// Parses the API-key map. Every key resolves to a named user with a
    /// role; unknown keys are rejected by the auth middleware.
    pub fn api_users(&self) -> anyhow::Result<HashMap<String, ApiUser>> {
        serde_json::from_str(&self.api_keys).context("Cannot parse the API_KEYS map")
    }

    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            database_url: "sqlite::memory:".to_string(),
            api_keys: concat!(
                r#"{"test-producer-key":{"name":"fog-producer","role":"produttore"},"#,
                r#""test-verifier-key":{"name":"auditor","role":"verificatore"}}"#,
            )
            .to_string(),
        }
    }
}
