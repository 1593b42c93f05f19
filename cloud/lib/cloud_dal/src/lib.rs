//! Data access layer (DAL) for the cloud service provider.
//!
//! The cloud never recomputes or stores leaf hashes: it keeps the raw
//! rows exactly as delivered and reconstructs hashes on demand, which is
//! what makes cloud-side tampering detectable by the verifier.

use std::str::FromStr;

pub use sqlx::Error as SqlxError;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{batches_dal::CloudBatchesDal, sensors_dal::CloudSensorsDal};

pub mod batches_dal;
pub mod sensors_dal;
pub mod testonly;


const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sensors (
    sensor_id   TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS batches (
    batch_id          INTEGER PRIMARY KEY,
    created_at        TEXT NOT NULL,
    measurement_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS measurements (
    measurement_id INTEGER PRIMARY KEY,
    batch_id       INTEGER NOT NULL REFERENCES batches (batch_id),
    sensor_id      TEXT NOT NULL REFERENCES sensors (sensor_id),
    timestamp      TEXT NOT NULL,
    data           TEXT NOT NULL
);
"#;

#[derive(Debug, Clone)]
pub struct CloudConnectionPool {
    pool: SqlitePool,
}

impl CloudConnectionPool {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let this = Self { pool };
        this.bootstrap().await?;
        Ok(this)
    }

    pub async fn connect_in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let this = Self { pool };
        this.bootstrap().await?;
        Ok(this)
    }

    async fn bootstrap(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn sensors_dal(&self) -> CloudSensorsDal<'_> {
        CloudSensorsDal { pool: &self.pool }
    }

    pub fn batches_dal(&self) -> CloudBatchesDal<'_> {
        CloudBatchesDal { pool: &self.pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
