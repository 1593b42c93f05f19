use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngressConfig {
    /// Bind address of the producer HTTP API.
    pub bind_addr: String,
}

impl IngressConfig {
    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}
