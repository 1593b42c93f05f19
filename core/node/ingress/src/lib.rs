//! HTTP ingestion API of the fog node.
//!
//! Two write endpoints, one DB mutation each. Sealing a batch is a side
//! effect of the measurement insert transaction; the ingress never runs
//! the processing pipeline itself, the scheduler picks sealed batches up
//! on its own tick.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fogseal_dal::{batches_dal::InsertMeasurementError, ConnectionPool};
use fogseal_types::{
    normalize_sensor_id, IngressMeasurement, Sensor, SensorKind, SensorPayload,
};

pub use crate::error::ApiError;

mod error;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub struct AppState {
    pub pool: ConnectionPool,
    pub batch_threshold: i64,
}

/// Builds the producer router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sensori", post(register_sensor))
        .route("/misurazioni", post(submit_measurement))
        .route("/batch/non-elaborabili", get(list_non_elaborable))
        .with_state(Arc::new(state))
}

async fn register_sensor(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SensorPayload>,
) -> Result<Response, ApiError> {
    let sensor_id = normalize_sensor_id(&payload.sensor_id)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let sensor = Sensor {
        kind: SensorKind::from_sensor_id(&sensor_id),
        sensor_id,
        description: payload.description,
        ack: false,
    };
    state.pool.sensors_dal().upsert_sensor(&sensor).await?;

    tracing::info!("Sensor registered: {}", sensor.sensor_id);
    Ok(Json(serde_json::json!({
        "status": "sensore registrato",
        "id_sensore": sensor.sensor_id,
        "tipo": sensor.kind,
        "descrizione": sensor.description,
    }))
    .into_response())
}

async fn submit_measurement(
    State(state): State<Arc<AppState>>,
    Json(measurement): Json<IngressMeasurement>,
) -> Result<Response, ApiError> {
    let sensor_id = normalize_sensor_id(measurement.sensor_id())
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let data = measurement.into_data_map();

    let inserted = state
        .pool
        .batches_dal()
        .insert_measurement(&sensor_id, &data, state.batch_threshold)
        .await
        // An unknown sensor surfaces as a store error to the caller; the
        // transaction guarantees no partial state was committed.
        .map_err(|err: InsertMeasurementError| ApiError::InternalServerError(err.to_string()))?;

    if let Some(sealed) = inserted.sealed_batch {
        tracing::info!("Batch {sealed} sealed, awaiting processing");
    }

    Ok(Json(serde_json::json!({
        "status": "misurazione registrata",
        "id_sensore": sensor_id,
        "id_misurazione": inserted.measurement_id,
        "timestamp": inserted.timestamp,
    }))
    .into_response())
}

async fn list_non_elaborable(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let parked = state.pool.batches_dal().list_non_elaborable().await?;
    Ok(Json(parked).into_response())
}
