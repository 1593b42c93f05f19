use fogseal_basic_types::BatchNumber;

/// Representation of a `batches` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageBatch {
    pub batch_id: i64,
    pub created_at: String,
    pub measurement_count: i64,
    pub complete: bool,
    pub ack: bool,
    pub elaborable: bool,
    pub merkle_root: Option<String>,
    pub path_cid: Option<String>,
    pub payload_json: Option<String>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl StorageBatch {
    pub fn number(&self) -> BatchNumber {
        BatchNumber(self.batch_id)
    }
}

/// Diagnostic row for a batch parked with `elaborable = false`.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct NonElaborableBatch {
    pub batch_id: i64,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}
