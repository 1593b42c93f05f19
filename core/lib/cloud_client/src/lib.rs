//! HTTP client for the cloud ingest service.
//!
//! Every failure here belongs to the transient `HTTP` class of the error
//! taxonomy: callers break out of their current work list and retry
//! on the next tick, never parking a batch over a network problem.

use std::{collections::BTreeMap, time::Duration};

use fogseal_basic_types::LeafId;
use fogseal_config::{CloudConfig, VerifierConfig};
use fogseal_types::SensorPayload;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum CloudClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cloud rejected the request with status {0}")]
    Rejected(u16),
    #[error("malformed cloud response: {0}")]
    MalformedResponse(String),
}

/// Confirmation envelope the cloud returns on write endpoints. The
/// producer flips its local ack only on an explicit
/// `conferma_ricezione = true`.
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    #[serde(rename = "conferma_ricezione")]
    pub confirmed: bool,
    #[serde(rename = "id_sensore", default)]
    pub sensor_id: Option<String>,
    #[serde(rename = "id_batch", default)]
    pub batch_id: Option<i64>,
    #[serde(rename = "messaggio", default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CloudClient {
    pub fn new(config: &CloudConfig) -> Result<Self, CloudClientError> {
        Self::from_parts(&config.base_url, &config.api_key, config.request_timeout())
    }

    /// The verifier talks to the same service with its own key.
    pub fn for_verifier(config: &VerifierConfig) -> Result<Self, CloudClientError> {
        Self::from_parts(
            &config.cloud_base_url,
            &config.api_key,
            config.request_timeout(),
        )
    }

    pub fn from_parts(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, CloudClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /sensori`: forwards a sensor registration.
    pub async fn register_sensor(
        &self,
        sensor: &SensorPayload,
    ) -> Result<AckResponse, CloudClientError> {
        let response = self
            .http
            .post(self.url("/sensori"))
            .header("X-API-Key", &self.api_key)
            .json(sensor)
            .send()
            .await?;
        Self::parse_ack(response).await
    }

    /// `POST /batch`: delivers a full batch payload. The body is the
    /// payload's canonical JSON exactly as persisted, byte for byte.
    pub async fn submit_batch(&self, payload_json: &str) -> Result<AckResponse, CloudClientError> {
        let response = self
            .http
            .post(self.url("/batch"))
            .header("X-API-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload_json.to_string())
            .send()
            .await?;
        Self::parse_ack(response).await
    }

    /// `GET /batch/mappa-id-hash?id=`: the id-to-leaf-hash map of a stored
    /// batch; key `"0"` is the batch leaf.
    pub async fn leaf_hash_map(
        &self,
        batch_id: i64,
    ) -> Result<BTreeMap<LeafId, String>, CloudClientError> {
        let response = self
            .http
            .get(self.url("/batch/mappa-id-hash"))
            .query(&[("id", batch_id)])
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CloudClientError::Rejected(response.status().as_u16()));
        }

        let raw: BTreeMap<String, String> = response
            .json()
            .await
            .map_err(|e| CloudClientError::MalformedResponse(e.to_string()))?;
        raw.into_iter()
            .map(|(key, hash)| {
                let id: LeafId = key.parse().map_err(|_| {
                    CloudClientError::MalformedResponse(format!("non-numeric leaf id {key:?}"))
                })?;
                Ok((id, hash))
            })
            .collect()
    }

    async fn parse_ack(response: reqwest::Response) -> Result<AckResponse, CloudClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CloudClientError::Rejected(status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| CloudClientError::MalformedResponse(e.to_string()))
    }
}
