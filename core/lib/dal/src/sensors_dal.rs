use fogseal_types::Sensor;
use sqlx::SqlitePool;

use crate::models::StorageSensor;

#[derive(Debug)]
pub struct SensorsDal<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl SensorsDal<'_> {
    /// Inserts a sensor, ignoring the write if the id is already known.
    /// Returns whether a new row was created.
    pub async fn upsert_sensor(&self, sensor: &Sensor) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO sensors (sensor_id, kind, description, ack)
            VALUES ($1, $2, $3, 0)
            "#,
        )
        .bind(&sensor.sensor_id)
        .bind(sensor.kind.as_str())
        .bind(&sensor.description)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_sensor(&self, sensor_id: &str) -> sqlx::Result<Option<Sensor>> {
        let row: Option<StorageSensor> = sqlx::query_as(
            r#"
            SELECT sensor_id, kind, description, ack
            FROM sensors
            WHERE sensor_id = $1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Sensor::from))
    }

    /// Sensors still waiting for the cloud to confirm their
    /// registration, bounded to `limit` per call.
    pub async fn select_unacked_sensors(&self, limit: i64) -> sqlx::Result<Vec<Sensor>> {
        let rows: Vec<StorageSensor> = sqlx::query_as(
            r#"
            SELECT sensor_id, kind, description, ack
            FROM sensors
            WHERE ack = 0
            ORDER BY sensor_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Sensor::from).collect())
    }

    /// Flips the cloud-confirmation flag to true. Monotonic: a second
    /// call is a no-op, and nothing ever writes it back to false.
    pub async fn ack_sensor(&self, sensor_id: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE sensors
            SET ack = 1
            WHERE sensor_id = $1 AND ack = 0
            "#,
        )
        .bind(sensor_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
