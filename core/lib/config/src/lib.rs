pub use crate::configs::{
    CloudApiConfig, CloudConfig, ForwarderConfig, IngressConfig, LocalStoreConfig,
    ObjectStoreConfig, VerifierConfig,
};

pub mod configs;

use anyhow::Context as _;
use serde::de::DeserializeOwned;

pub trait FromEnv: Sized {
    fn from_env() -> anyhow::Result<Self>;
}

/// Loads a config struct from prefixed environment variables.
pub fn envy_load<T: DeserializeOwned>(name: &str, prefix: &str) -> anyhow::Result<T> {
    envy::prefixed(prefix)
        .from_env()
        .with_context(|| format!("Cannot load config <{name}>"))
}

impl FromEnv for LocalStoreConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: LocalStoreConfig = envy_load("local_store", "FOGSEAL_STORE_")?;
        config.validate()?;
        Ok(config)
    }
}

impl FromEnv for IngressConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("ingress", "FOGSEAL_INGRESS_")
    }
}

impl FromEnv for CloudConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("cloud", "FOGSEAL_CLOUD_")
    }
}

impl FromEnv for ObjectStoreConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("object_store", "FOGSEAL_OBJECT_STORE_")
    }
}

impl FromEnv for ForwarderConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("forwarder", "FOGSEAL_FORWARDER_")
    }
}

impl FromEnv for CloudApiConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("cloud_api", "FOGSEAL_CLOUD_API_")
    }
}

impl FromEnv for VerifierConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("verifier", "FOGSEAL_VERIFIER_")
    }
}
