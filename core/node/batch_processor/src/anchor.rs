use std::fmt;

use async_trait::async_trait;
use fogseal_basic_types::BatchNumber;

/// Sink anchoring a batch's Merkle root and path CID to an immutable
/// store. A failed anchor makes the batch non-deliverable.
#[async_trait]
pub trait Anchor: fmt::Debug + Send + Sync {
    async fn anchor_root(
        &self,
        batch: BatchNumber,
        merkle_root: &str,
        path_cid: &str,
    ) -> anyhow::Result<()>;
}

/// Placeholder anchor until a real immutable store is wired in: records
/// the root in the log and succeeds.
#[derive(Debug, Default)]
pub struct NoopAnchor;

#[async_trait]
impl Anchor for NoopAnchor {
    async fn anchor_root(
        &self,
        batch: BatchNumber,
        merkle_root: &str,
        path_cid: &str,
    ) -> anyhow::Result<()> {
        tracing::info!("Anchored batch {batch}: root {merkle_root}, path cid {path_cid}");
        Ok(())
    }
}
