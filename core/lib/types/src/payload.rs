use std::collections::BTreeMap;

use fogseal_basic_types::{LeafId, BATCH_LEAF_ID};
use fogseal_crypto::canonical_hash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Batch metadata, the content of the reserved leaf 0.
///
/// The Merkle root is deliberately not a field here: the batch leaf must
/// be hashable before the tree exists. The root lives in its own store
/// column next to the path CID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMeta {
    #[serde(rename = "id_batch")]
    pub batch_id: i64,
    #[serde(rename = "timestamp_creazione")]
    pub created_at: String,
    #[serde(rename = "numero_misurazioni")]
    pub measurement_count: i64,
}

/// A stored measurement, the content of leaf `measurement_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "id_misurazione")]
    pub measurement_id: i64,
    #[serde(rename = "id_sensore")]
    pub sensor_id: String,
    pub timestamp: String,
    #[serde(rename = "dati")]
    pub data: Map<String, Value>,
}

/// The full batch payload delivered to the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub batch: BatchMeta,
    #[serde(rename = "misurazioni")]
    pub measurements: Vec<MeasurementRecord>,
}

/// One row of the `(batch JOIN measurement)` query the producer and the
/// cloud both run when reconstructing a batch.
#[derive(Debug, Clone)]
pub struct BatchJoinRow {
    pub measurement_id: i64,
    pub sensor_id: String,
    pub timestamp: String,
    pub data_json: String,
    pub batch_id: i64,
    pub created_at: String,
    pub measurement_count: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("batch has no measurements")]
    EmptyBatch,
    #[error("measurement {measurement_id} carries malformed data: {source}")]
    MalformedData {
        measurement_id: i64,
        #[source]
        source: serde_json::Error,
    },
    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Payload plus the ordered id-to-hash map over its leaves: the batch leaf
/// first at id 0, then every measurement in ascending id order.
#[derive(Debug, Clone)]
pub struct LeafSet {
    payload: Payload,
    id_hash_map: BTreeMap<LeafId, String>,
}

impl LeafSet {
    /// Builds the payload and its leaf hashes from joined store rows.
    /// Rows may arrive in any order; measurements are sorted by id.
    pub fn from_rows(mut rows: Vec<BatchJoinRow>) -> Result<Self, PayloadError> {
        if rows.is_empty() {
            return Err(PayloadError::EmptyBatch);
        }
        rows.sort_by_key(|row| row.measurement_id);

        let batch = BatchMeta {
            batch_id: rows[0].batch_id,
            created_at: rows[0].created_at.clone(),
            measurement_count: rows[0].measurement_count,
        };

        let mut measurements = Vec::with_capacity(rows.len());
        for row in rows {
            let data: Map<String, Value> = serde_json::from_str(&row.data_json).map_err(|e| {
                PayloadError::MalformedData {
                    measurement_id: row.measurement_id,
                    source: e,
                }
            })?;
            measurements.push(MeasurementRecord {
                measurement_id: row.measurement_id,
                sensor_id: row.sensor_id,
                timestamp: row.timestamp,
                data,
            });
        }

        Self::from_payload(Payload {
            batch,
            measurements,
        })
    }

    /// Recomputes leaf hashes for an existing payload. Used by the cloud
    /// (serving the id-to-hash map from stored rows) and by the producer.
    pub fn from_payload(payload: Payload) -> Result<Self, PayloadError> {
        if payload.measurements.is_empty() {
            return Err(PayloadError::EmptyBatch);
        }

        let mut id_hash_map = BTreeMap::new();
        id_hash_map.insert(BATCH_LEAF_ID, canonical_hash(&payload.batch)?);
        for measurement in &payload.measurements {
            id_hash_map.insert(
                measurement.measurement_id as LeafId,
                canonical_hash(measurement)?,
            );
        }

        Ok(LeafSet {
            payload,
            id_hash_map,
        })
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// The ordered id-to-hash map; iteration starts at the batch leaf (id 0).
    pub fn id_hash_map(&self) -> &BTreeMap<LeafId, String> {
        &self.id_hash_map
    }

    /// Splits the map into the parallel `(ids, hashes)` lists the Merkle
    /// engine consumes.
    pub fn ordered_leaves(&self) -> (Vec<LeafId>, Vec<String>) {
        let ids = self.id_hash_map.keys().copied().collect();
        let hashes = self.id_hash_map.values().cloned().collect();
        (ids, hashes)
    }
}
