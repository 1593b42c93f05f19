//! The verifier: checks a cloud-stored batch against its externally
//! anchored Merkle root.
//!
//! The cloud serves recomputed leaf hashes, the object store serves the
//! compact paths the producer published, and the anchored root ties them
//! together. Because the batch metadata and the measurements are
//! separate leaves of the same tree, the report can tell apart (a)
//! tampered measurement rows, (b) a tampered batch row, (c) both, and
//! (d) added or removed rows.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context as _;
use fogseal_basic_types::{LeafId, BATCH_LEAF_ID};
use fogseal_cloud_client::CloudClient;
use fogseal_config::VerifierConfig;
use fogseal_merkle_tree::{verify_leaf, CompactPath};
use fogseal_object_store::{FilebaseStore, ObjectStore};

pub use crate::report::{LeafKind, LeafVerdict, VerificationDetails, VerificationReport};

mod report;


#[derive(Debug)]
pub struct Verifier {
    cloud: CloudClient,
    store: Arc<dyn ObjectStore>,
}

impl Verifier {
    pub fn new(config: &VerifierConfig) -> anyhow::Result<Self> {
        let cloud = CloudClient::for_verifier(config)?;
        let store = FilebaseStore::gateway_only(&config.gateway_url, config.request_timeout())?;
        Ok(Self {
            cloud,
            store: Arc::new(store),
        })
    }

    pub fn from_parts(cloud: CloudClient, store: Arc<dyn ObjectStore>) -> Self {
        Self { cloud, store }
    }

    /// Verifies `batch_id` against the anchored `expected_root`, pulling
    /// the id-to-hash map from the cloud and the paths blob at `path_cid`
    /// from the object-store gateway.
    pub async fn verify_batch(
        &self,
        batch_id: i64,
        expected_root: &str,
        path_cid: &str,
    ) -> anyhow::Result<VerificationReport> {
        let id_hash_map = self
            .cloud
            .leaf_hash_map(batch_id)
            .await
            .with_context(|| format!("failed to fetch the leaf map of batch {batch_id}"))?;

        let paths_json = self
            .store
            .fetch(path_cid)
            .await
            .with_context(|| format!("failed to fetch the paths blob {path_cid}"))?;
        let paths = parse_paths(&paths_json)?;

        // Structural check first: the id sets (batch leaf aside) must
        // coincide, otherwise rows were added or removed cloud-side.
        let missing_ids: Vec<LeafId> = paths
            .keys()
            .filter(|id| **id != BATCH_LEAF_ID && !id_hash_map.contains_key(id))
            .copied()
            .collect();
        let unexpected_ids: Vec<LeafId> = id_hash_map
            .keys()
            .filter(|id| **id != BATCH_LEAF_ID && !paths.contains_key(id))
            .copied()
            .collect();

        let mut details = VerificationDetails::default();
        for (id, leaf_hash) in &id_hash_map {
            let kind = LeafKind::of(*id);
            match paths.get(id) {
                Some(path) => {
                    let valid = verify_leaf(leaf_hash, path, expected_root);
                    let verdict = LeafVerdict {
                        id: *id,
                        kind,
                        valid,
                        note: (!valid)
                            .then(|| "leaf hash does not reduce to the anchored root".to_string()),
                    };
                    if valid {
                        details.ok.push(verdict);
                    } else {
                        details.anomalies.push(verdict);
                    }
                }
                None => details.anomalies.push(LeafVerdict {
                    id: *id,
                    kind,
                    valid: false,
                    note: Some("no merkle path vouches for this id".to_string()),
                }),
            }
        }
        for id in &missing_ids {
            details.anomalies.push(LeafVerdict {
                id: *id,
                kind: LeafKind::of(*id),
                valid: false,
                note: Some("missing from the cloud id-to-hash map".to_string()),
            });
        }

        let structurally_intact = missing_ids.is_empty() && unexpected_ids.is_empty();
        let report = VerificationReport {
            global_ok: structurally_intact && details.anomalies.is_empty(),
            anomaly_count: details.anomalies.len(),
            missing_ids,
            unexpected_ids,
            details,
        };

        if report.global_ok {
            tracing::info!(
                "Batch {batch_id} intact: {} leaves verified",
                report.details.ok.len()
            );
        } else {
            tracing::warn!(
                "Batch {batch_id} TAMPERED: {} anomalies, {} missing ids, {} unexpected ids",
                report.anomaly_count,
                report.missing_ids.len(),
                report.unexpected_ids.len(),
            );
        }
        Ok(report)
    }
}

fn parse_paths(json: &str) -> anyhow::Result<BTreeMap<LeafId, CompactPath>> {
    let raw: BTreeMap<String, CompactPath> =
        serde_json::from_str(json).context("malformed merkle paths blob")?;
    raw.into_iter()
        .map(|(key, path)| {
            let id: LeafId = key
                .parse()
                .with_context(|| format!("non-numeric leaf id {key:?} in the paths blob"))?;
            Ok((id, path))
        })
        .collect()
}
