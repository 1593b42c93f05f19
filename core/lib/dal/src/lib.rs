//! Data access layer (DAL) for the fog producer's local store.
//!
//! The store is the single shared resource of the producer process: the
//! HTTP ingress and the three periodic workers all talk to it through
//! this crate, one short transaction per call, and never hold a
//! transaction across an outbound network call.

use std::str::FromStr;

pub use sqlx::Error as SqlxError;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{batches_dal::BatchesDal, sensors_dal::SensorsDal};

pub mod batches_dal;
pub mod models;
pub mod sensors_dal;

#[cfg(test)]
mod tests;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sensors (
    sensor_id   TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    description TEXT NOT NULL,
    ack         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS batches (
    batch_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at        TEXT NOT NULL,
    measurement_count INTEGER NOT NULL DEFAULT 0,
    complete          INTEGER NOT NULL DEFAULT 0,
    ack               INTEGER NOT NULL DEFAULT 0,
    elaborable        INTEGER NOT NULL DEFAULT 1,
    merkle_root       TEXT DEFAULT NULL,
    path_cid          TEXT DEFAULT NULL,
    payload_json      TEXT DEFAULT NULL,
    error_kind        TEXT DEFAULT NULL,
    error_message     TEXT DEFAULT NULL
);

CREATE TABLE IF NOT EXISTS measurements (
    measurement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sensor_id      TEXT NOT NULL REFERENCES sensors (sensor_id),
    batch_id       INTEGER NOT NULL REFERENCES batches (batch_id),
    timestamp      TEXT NOT NULL,
    data           TEXT NOT NULL
);
"#;

/// Pool of connections to the producer's SQLite store. Cheap to clone;
/// every actor in the process shares one instance.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
}

impl ConnectionPool {
    /// Opens (creating if missing) the database at `database_url` and
    /// bootstraps the schema. Foreign keys are enforced on every
    /// connection.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let this = Self { pool };
        this.bootstrap().await?;
        Ok(this)
    }

    /// In-memory store for tests. Pinned to a single connection so the
    /// database outlives individual acquires.
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

    pub fn sensors_dal(&self) -> SensorsDal<'_> {
        SensorsDal { pool: &self.pool }
    }

    pub fn batches_dal(&self) -> BatchesDal<'_> {
        BatchesDal { pool: &self.pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
