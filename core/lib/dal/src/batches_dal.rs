use fogseal_basic_types::{BatchNumber, ErrorKind};
use fogseal_types::BatchJoinRow;
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};

use crate::models::{NonElaborableBatch, StorageBatch};

#[derive(Debug, thiserror::Error)]
pub enum InsertMeasurementError {
    #[error("sensor {0} is not registered")]
    UnknownSensor(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("cannot serialize measurement data: {0}")]
    Data(#[from] serde_json::Error),
}

/// Outcome of a successful measurement insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedMeasurement {
    pub measurement_id: i64,
    pub batch: BatchNumber,
    pub timestamp: String,
    /// Set when this insert reached the threshold and sealed the batch.
    pub sealed_batch: Option<BatchNumber>,
}

#[derive(Debug)]
pub struct BatchesDal<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl BatchesDal<'_> {
    /// Appends a measurement to the currently open batch, creating one if
    /// none is open, and seals the batch when `threshold` is reached.
    ///
    /// All five effects (sensor check, batch lookup/creation, measurement
    /// insert, counter bump, sealing) commit in a single transaction, so
    /// an ingress failure leaves no partial state behind.
    pub async fn insert_measurement(
        &self,
        sensor_id: &str,
        data: &Map<String, Value>,
        threshold: i64,
    ) -> Result<InsertedMeasurement, InsertMeasurementError> {
        let mut tx = self.pool.begin().await?;

        let sensor_known: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM sensors WHERE sensor_id = $1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(&mut *tx)
        .await?;
        if sensor_known.is_none() {
            return Err(InsertMeasurementError::UnknownSensor(sensor_id.to_string()));
        }

        let open_batch: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT batch_id, measurement_count
            FROM batches
            WHERE complete = 0
            ORDER BY batch_id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let timestamp = now_iso();
        let (batch_id, current_count) = match open_batch {
            Some(row) => row,
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO batches (created_at, measurement_count, complete, ack)
                    VALUES ($1, 0, 0, 0)
                    "#,
                )
                .bind(&timestamp)
                .execute(&mut *tx)
                .await?;
                (result.last_insert_rowid(), 0)
            }
        };

        let data_json = serde_json::to_string(&Value::Object(data.clone()))?;
        let result = sqlx::query(
            r#"
            INSERT INTO measurements (sensor_id, batch_id, timestamp, data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(sensor_id)
        .bind(batch_id)
        .bind(&timestamp)
        .bind(&data_json)
        .execute(&mut *tx)
        .await?;
        let measurement_id = result.last_insert_rowid();

        let new_count = current_count + 1;
        let sealed = new_count >= threshold;
        sqlx::query(
            r#"
            UPDATE batches
            SET measurement_count = $1, complete = $2
            WHERE batch_id = $3
            "#,
        )
        .bind(new_count)
        .bind(sealed)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(InsertedMeasurement {
            measurement_id,
            batch: BatchNumber(batch_id),
            timestamp,
            sealed_batch: sealed.then_some(BatchNumber(batch_id)),
        })
    }

    /// The smallest sealed batch that still needs processing: complete,
    /// unacked, elaborable, and missing its root or payload.
    pub async fn select_sealed_unprocessed(&self) -> sqlx::Result<Option<BatchNumber>> {
        let batch_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MIN(batch_id)
            FROM batches
            WHERE complete = 1
              AND ack = 0
              AND elaborable = 1
              AND (merkle_root IS NULL OR payload_json IS NULL)
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        Ok(batch_id.map(BatchNumber))
    }

    /// Processed batches ready to leave for the cloud. A batch qualifies
    /// only when every sensor referenced by its measurements has been
    /// acked cloud-side, so delivery can never violate the cloud's
    /// foreign keys.
    pub async fn select_ready_for_delivery(
        &self,
        limit: i64,
    ) -> sqlx::Result<Vec<(BatchNumber, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT b.batch_id, b.payload_json
            FROM batches b
            WHERE b.payload_json IS NOT NULL
              AND b.ack = 0
              AND b.elaborable = 1
              AND NOT EXISTS (
                  SELECT 1
                  FROM measurements m
                  JOIN sensors s ON s.sensor_id = m.sensor_id
                  WHERE m.batch_id = b.batch_id
                    AND s.ack = 0
              )
            ORDER BY b.batch_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok((
                    BatchNumber(row.try_get::<i64, _>("batch_id")?),
                    row.try_get::<String, _>("payload_json")?,
                ))
            })
            .collect()
    }

    /// The `(batch JOIN measurement)` row set for one batch, ordered by
    /// measurement id.
    pub async fn load_batch_rows(&self, batch: BatchNumber) -> sqlx::Result<Vec<BatchJoinRow>> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.measurement_id,
                m.sensor_id,
                m.timestamp,
                m.data,
                b.batch_id,
                b.created_at,
                b.measurement_count
            FROM measurements m
            INNER JOIN batches b ON m.batch_id = b.batch_id
            WHERE b.batch_id = $1
            ORDER BY m.measurement_id ASC
            "#,
        )
        .bind(batch.0)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BatchJoinRow {
                    measurement_id: row.try_get("measurement_id")?,
                    sensor_id: row.try_get("sensor_id")?,
                    timestamp: row.try_get("timestamp")?,
                    data_json: row.try_get("data")?,
                    batch_id: row.try_get("batch_id")?,
                    created_at: row.try_get("created_at")?,
                    measurement_count: row.try_get("measurement_count")?,
                })
            })
            .collect()
    }

    /// Persists the processing artifacts in one update, flipping the
    /// batch from "sealed" to "processed" atomically.
    pub async fn record_batch_artifacts(
        &self,
        batch: BatchNumber,
        merkle_root: &str,
        path_cid: &str,
        payload_json: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE batches
            SET merkle_root = $1, path_cid = $2, payload_json = $3
            WHERE batch_id = $4
            "#,
        )
        .bind(merkle_root)
        .bind(path_cid)
        .bind(payload_json)
        .bind(batch.0)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Parks a batch after an unrecoverable pipeline failure. The batch
    /// stops being selected by every worker; recovery is manual.
    pub async fn mark_batch_error(
        &self,
        batch: BatchNumber,
        kind: ErrorKind,
        message: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE batches
            SET elaborable = 0, error_kind = $1, error_message = $2
            WHERE batch_id = $3
            "#,
        )
        .bind(kind.as_str())
        .bind(message)
        .bind(batch.0)
        .execute(self.pool)
        .await?;

        tracing::warn!("Batch {batch} marked non-elaborable: {kind}");
        Ok(())
    }

    /// Flips the cloud-confirmation flag to true. Only a sealed batch can
    /// have been delivered; monotonic like the sensor ack.
    pub async fn ack_batch(&self, batch: BatchNumber) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE batches
            SET ack = 1
            WHERE batch_id = $1 AND complete = 1 AND ack = 0
            "#,
        )
        .bind(batch.0)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Batches parked with `elaborable = false`, for diagnostics.
    pub async fn list_non_elaborable(&self) -> sqlx::Result<Vec<NonElaborableBatch>> {
        sqlx::query_as(
            r#"
            SELECT batch_id, error_kind, error_message, created_at
            FROM batches
            WHERE elaborable = 0
            ORDER BY batch_id
            "#,
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn get_batch(&self, batch: BatchNumber) -> sqlx::Result<Option<StorageBatch>> {
        sqlx::query_as(
            r#"
            SELECT batch_id, created_at, measurement_count, complete, ack, elaborable,
                   merkle_root, path_cid, payload_json, error_kind, error_message
            FROM batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch.0)
        .fetch_optional(self.pool)
        .await
    }
}

fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
