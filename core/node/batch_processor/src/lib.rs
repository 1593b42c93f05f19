//! The sealed-batch processing pipeline.
//!
//! For one sealed batch: load its rows, build the payload and leaf
//! hashes, build the Merkle tree, publish the compact paths to the
//! object store, persist `(root, cid, payload_json)` in one update, and
//! anchor the root. Every step before the persist is a pure function of
//! the batch contents, so a crash anywhere leaves the batch selectable
//! and the retry recomputes byte-identical artifacts (and the same
//! content-addressed object key).

use std::sync::Arc;

use anyhow::Context as _;
use fogseal_basic_types::{BatchNumber, ErrorKind};
use fogseal_crypto::canonical_json;
use fogseal_dal::ConnectionPool;
use fogseal_merkle_tree::MerkleTree;
use fogseal_object_store::{content_key, ObjectStore};
use fogseal_types::LeafSet;

pub use crate::anchor::{Anchor, NoopAnchor};
use crate::metrics::METRICS;

pub mod anchor;
mod metrics;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub struct BatchProcessor {
    pool: ConnectionPool,
    object_store: Arc<dyn ObjectStore>,
    anchor: Arc<dyn Anchor>,
    gzip_paths: bool,
}

impl BatchProcessor {
    pub fn new(
        pool: ConnectionPool,
        object_store: Arc<dyn ObjectStore>,
        anchor: Arc<dyn Anchor>,
        gzip_paths: bool,
    ) -> Self {
        Self {
            pool,
            object_store,
            anchor,
            gzip_paths,
        }
    }

    /// Picks the smallest sealed-but-unprocessed batch and runs the
    /// pipeline on it. Returns whether a batch was processed to
    /// completion.
    pub async fn process_next(&self) -> anyhow::Result<bool> {
        let Some(batch) = self
            .pool
            .batches_dal()
            .select_sealed_unprocessed()
            .await
            .context("failed to select a sealed batch")?
        else {
            return Ok(false);
        };
        self.process(batch).await
    }

    /// Runs the pipeline on `batch`. Fatal failures park the batch with
    /// the matching error kind and return `Ok(false)`; recoverable store
    /// failures bubble up as `Err` and are retried on the next tick.
    pub async fn process(&self, batch: BatchNumber) -> anyhow::Result<bool> {
        let dal = self.pool.batches_dal();

        let rows = dal
            .load_batch_rows(batch)
            .await
            .with_context(|| format!("failed to load rows of batch {batch}"))?;
        if rows.is_empty() {
            tracing::warn!("Batch {batch} has no measurements, nothing to process");
            return Ok(false);
        }

        let leaf_set = match LeafSet::from_rows(rows) {
            Ok(leaf_set) => leaf_set,
            Err(err) => {
                self.park(batch, ErrorKind::PayloadInvalid, &err.to_string())
                    .await?;
                return Ok(false);
            }
        };
        let payload_json = match canonical_json(leaf_set.payload()) {
            Ok(json) => json,
            Err(err) => {
                self.park(batch, ErrorKind::PayloadInvalid, &err.to_string())
                    .await?;
                return Ok(false);
            }
        };

        let (ids, hashes) = leaf_set.ordered_leaves();
        let tree = match MerkleTree::build(&hashes, &ids) {
            Ok(tree) => tree,
            Err(err) => {
                self.park(batch, ErrorKind::MerkleInvalid, &err.to_string())
                    .await?;
                return Ok(false);
            }
        };
        let (root, paths) = tree.into_parts();
        let paths_json = match canonical_json(&paths) {
            Ok(json) => json,
            Err(err) => {
                self.park(batch, ErrorKind::MerkleInvalid, &err.to_string())
                    .await?;
                return Ok(false);
            }
        };

        let key = content_key(&paths_json, self.gzip_paths);
        let upload_latency = METRICS.path_upload_latency.start();
        let cid = match self
            .object_store
            .put_json(&key, &paths_json, self.gzip_paths)
            .await
        {
            Ok(cid) => cid,
            Err(err) => {
                self.park(batch, ErrorKind::Ipfs, &err.to_string()).await?;
                return Ok(false);
            }
        };
        upload_latency.observe();
        METRICS.paths_blob_size.observe(paths_json.len());

        // A failure between the successful upload and this update is
        // recoverable: the next run recomputes the same content key and
        // the store dedupes the re-upload.
        dal.record_batch_artifacts(batch, &root, &cid, &payload_json)
            .await
            .inspect_err(|_| {
                METRICS.transient_errors.inc();
            })
            .with_context(|| format!("failed to record artifacts of batch {batch}"))?;

        if let Err(err) = self.anchor.anchor_root(batch, &root, &cid).await {
            self.park(batch, ErrorKind::Blockchain, &err.to_string())
                .await?;
            return Ok(false);
        }

        METRICS.last_processed_batch.set(batch.0 as usize);
        tracing::info!(
            "Processed batch {batch}: root {root}, path cid {cid}, {size} payload bytes",
            size = payload_json.len(),
        );
        Ok(true)
    }

    async fn park(&self, batch: BatchNumber, kind: ErrorKind, message: &str) -> anyhow::Result<()> {
        METRICS.fatal_errors.inc();
        tracing::error!("Batch {batch} failed with {kind}: {message}");
        self.pool
            .batches_dal()
            .mark_batch_error(batch, kind, message)
            .await
            .with_context(|| format!("failed to park batch {batch} after {kind}"))
    }
}
