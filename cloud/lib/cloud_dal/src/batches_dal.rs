use fogseal_types::{BatchJoinRow, BatchMeta, MeasurementRecord, Payload};
use sqlx::{Row, SqlitePool};

#[derive(Debug)]
pub struct CloudBatchesDal<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl CloudBatchesDal<'_> {
    /// Persists a delivered payload: the batch row, then its
    /// measurements, in one transaction. Everything is insert-or-ignore
    /// by primary key, so a payload observed twice (at-least-once
    /// delivery) changes nothing on the second write.
    pub async fn insert_payload(&self, payload: &Payload) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO batches (batch_id, created_at, measurement_count)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(payload.batch.batch_id)
        .bind(&payload.batch.created_at)
        .bind(payload.batch.measurement_count)
        .execute(&mut *tx)
        .await?;

        for measurement in &payload.measurements {
            let data_json = serde_json::to_string(&measurement.data)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO measurements
                    (measurement_id, batch_id, sensor_id, timestamp, data)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(measurement.measurement_id)
            .bind(payload.batch.batch_id)
            .bind(&measurement.sensor_id)
            .bind(&measurement.timestamp)
            .bind(&data_json)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// The `(batch JOIN measurement)` row set of a stored batch, ordered by
    /// measurement id. Empty when the batch is unknown.
    pub async fn load_batch_rows(&self, batch_id: i64) -> sqlx::Result<Vec<BatchJoinRow>> {
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
        .bind(batch_id)
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

    pub async fn get_batch_meta(&self, batch_id: i64) -> sqlx::Result<Option<BatchMeta>> {
        let row = sqlx::query(
            r#"
            SELECT batch_id, created_at, measurement_count
            FROM batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            Ok(BatchMeta {
                batch_id: row.try_get("batch_id")?,
                created_at: row.try_get("created_at")?,
                measurement_count: row.try_get("measurement_count")?,
            })
        })
        .transpose()
    }

    pub async fn get_measurement(
        &self,
        measurement_id: i64,
    ) -> sqlx::Result<Option<MeasurementRecord>> {
        let row = sqlx::query(
            r#"
            SELECT measurement_id, sensor_id, timestamp, data
            FROM measurements
            WHERE measurement_id = $1
            "#,
        )
        .bind(measurement_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            let data_json: String = row.try_get("data")?;
            let data = serde_json::from_str(&data_json)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            Ok(MeasurementRecord {
                measurement_id: row.try_get("measurement_id")?,
                sensor_id: row.try_get("sensor_id")?,
                timestamp: row.try_get("timestamp")?,
                data,
            })
        })
        .transpose()
    }
}
