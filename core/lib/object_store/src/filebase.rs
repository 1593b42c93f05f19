use async_trait::async_trait;
use fogseal_config::ObjectStoreConfig;

use crate::{gzip, ObjectStore, ObjectStoreError};

/// Name of the metadata header carrying the CID of an uploaded object.
const CID_METADATA_HEADER: &str = "x-amz-meta-cid";

/// Client for a Filebase-style S3-compatible endpoint backed by a
/// content-addressed network.
#[derive(Debug, Clone)]
pub struct FilebaseStore {
    client: reqwest::Client,
    endpoint_url: String,
    gateway_url: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl FilebaseStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Read-only client for actors that only fetch by CID (the
    /// verifier): no bucket, no credentials, gateway access only.
    pub fn gateway_only(
        gateway_url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, ObjectStoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint_url: String::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint_url, self.bucket, key)
    }

    /// Reads the CID from the metadata of an already uploaded object.
    /// Fallback for servers that only expose metadata on HEAD.
    async fn head_cid(&self, key: &str) -> Result<String, ObjectStoreError> {
        let response = self
            .client
            .head(self.object_url(key))
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .send()
            .await?;

        response
            .headers()
            .get(CID_METADATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|cid| !cid.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ObjectStoreError::CidMissing {
                key: key.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for FilebaseStore {
    async fn put_json(
        &self,
        key: &str,
        json: &str,
        compress: bool,
    ) -> Result<String, ObjectStoreError> {
        let body = if compress {
            gzip::compress(json.as_bytes())?
        } else {
            json.as_bytes().to_vec()
        };

        let mut request = self
            .client
            .put(self.object_url(key))
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if compress {
            request = request.header(reqwest::header::CONTENT_ENCODING, "gzip");
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ObjectStoreError::UploadRejected {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        // The store pins the content and reports the CID in the object
        // metadata, either directly on the PUT response or via HEAD.
        if let Some(cid) = response
            .headers()
            .get(CID_METADATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|cid| !cid.is_empty())
        {
            tracing::debug!("Uploaded {key}, cid {cid}");
            return Ok(cid.to_string());
        }
        self.head_cid(key).await
    }

    async fn fetch(&self, cid: &str) -> Result<String, ObjectStoreError> {
        let url = format!("{}/ipfs/{}", self.gateway_url, cid);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ObjectStoreError::FetchRejected {
                cid: cid.to_string(),
                status: response.status().as_u16(),
            });
        }

        let gzipped = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(|encoding| encoding.contains("gzip"))
            .unwrap_or(false)
            || response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|content_type| content_type.contains("application/gzip"))
                .unwrap_or(false);

        let bytes = response.bytes().await?;
        let raw = if gzipped {
            gzip::decompress(&bytes)?
        } else {
            bytes.to_vec()
        };
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}
