//! Row-tampering helpers for integrity tests and drills. These bypass
//! the write path on purpose: the whole point of the pipeline is that
//! the verifier catches exactly these edits.

use crate::CloudConnectionPool;

impl CloudConnectionPool {
    /// Overwrites the data column of a stored measurement.
    pub async fn tamper_measurement_data(
        &self,
        measurement_id: i64,
        data_json: &str,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE measurements SET data = $1 WHERE measurement_id = $2")
            .bind(data_json)
            .bind(measurement_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrites the creation timestamp of a stored batch.
    pub async fn tamper_batch_created_at(
        &self,
        batch_id: i64,
        created_at: &str,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE batches SET created_at = $1 WHERE batch_id = $2")
            .bind(created_at)
            .bind(batch_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes a stored measurement row entirely.
    pub async fn tamper_delete_measurement(&self, measurement_id: i64) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM measurements WHERE measurement_id = $1")
            .bind(measurement_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
