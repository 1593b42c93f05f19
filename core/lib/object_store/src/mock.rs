use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use fogseal_crypto::sha256_hex;
use tokio::sync::Mutex;

use crate::{ObjectStore, ObjectStoreError};

/// In-memory object store used in tests and local development.
///
/// Content-addressed like the real thing: identical content maps to the
/// same CID, and re-uploads overwrite nothing.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Mutex<HashMap<String, String>>,
    fail_uploads: AtomicBool,
    put_count: AtomicUsize,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent upload fail, simulating a dead store.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful uploads so far.
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    fn cid_for(json: &str) -> String {
        format!("Qm{}", &sha256_hex(json.as_bytes())[..38])
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_json(
        &self,
        key: &str,
        json: &str,
        _gzip: bool,
    ) -> Result<String, ObjectStoreError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::UploadRejected {
                key: key.to_string(),
                status: 503,
            });
        }
        let cid = Self::cid_for(json);
        self.objects
            .lock()
            .await
            .insert(cid.clone(), json.to_string());
        self.put_count.fetch_add(1, Ordering::SeqCst);
        Ok(cid)
    }

    async fn fetch(&self, cid: &str) -> Result<String, ObjectStoreError> {
        self.objects
            .lock()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| ObjectStoreError::FetchRejected {
                cid: cid.to_string(),
                status: 404,
            })
    }
}
