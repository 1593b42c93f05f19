use fogseal_types::{SensorKind, SensorPayload};
use sqlx::SqlitePool;

#[derive(Debug)]
pub struct CloudSensorsDal<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl CloudSensorsDal<'_> {
    /// Persists a sensor registration. Duplicates are ignored by primary
    /// key, so producer-side retries are harmless.
    pub async fn insert_sensor(&self, sensor: &SensorPayload) -> sqlx::Result<()> {
        let kind = sensor
            .kind
            .unwrap_or_else(|| SensorKind::from_sensor_id(&sensor.sensor_id));
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO sensors (sensor_id, kind, description)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&sensor.sensor_id)
        .bind(kind.as_str())
        .bind(&sensor.description)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn sensor_exists(&self, sensor_id: &str) -> sqlx::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM sensors WHERE sensor_id = $1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(found.is_some())
    }
}
