use fogseal_basic_types::{LeafId, BATCH_LEAF_ID};
use serde::{Deserialize, Serialize};

/// What a leaf represents, so the report can localize tampering to the
/// batch metadata or to single measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafKind {
    #[serde(rename = "batch")]
    Batch,
    #[serde(rename = "misurazione")]
    Measurement,
}

impl LeafKind {
    pub fn of(id: LeafId) -> Self {
        if id == BATCH_LEAF_ID {
            LeafKind::Batch
        } else {
            LeafKind::Measurement
        }
    }
}

/// Per-leaf verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafVerdict {
    pub id: LeafId,
    pub kind: LeafKind,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub ok: Vec<LeafVerdict>,
    pub anomalies: Vec<LeafVerdict>,
}

/// The complete verdict over one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True iff the structural check passed and every leaf verified.
    pub global_ok: bool,
    pub anomaly_count: usize,
    /// Leaf ids the paths prove but the cloud no longer serves.
    pub missing_ids: Vec<LeafId>,
    /// Leaf ids the cloud serves but no path vouches for.
    pub unexpected_ids: Vec<LeafId>,
    pub details: VerificationDetails,
}
