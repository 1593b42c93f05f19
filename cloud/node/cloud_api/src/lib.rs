//! HTTP API of the cloud service provider.
//!
//! Write endpoints (producer role) persist sensors and batch payloads
//! with insert-or-ignore idempotency. Read-back endpoints (verifier
//! role; the producer role implies it) serve the stored rows and the
//! recomputed id-to-leaf-hash map the verifier checks against the anchored
//! root.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use fogseal_basic_types::roles::ApiUser;
use fogseal_cloud_dal::CloudConnectionPool;
use fogseal_config::CloudApiConfig;
use fogseal_types::{LeafSet, Payload, SensorPayload};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::auth::{require_verifier, require_writer};
pub use crate::error::ApiError;

mod auth;
mod error;

#[cfg(test)]
mod tests;

const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct AppState {
    pub pool: CloudConnectionPool,
    pub api_users: HashMap<String, ApiUser>,
}

impl AppState {
    pub fn new(pool: CloudConnectionPool, config: &CloudApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pool,
            api_users: config.api_users()?,
        })
    }
}

/// Builds the cloud router with the API-key middleware applied to every
/// route.
pub fn router(state: AppState) -> Router {
    let shared_state = Arc::new(state);
    let auth_mw = middleware::from_fn_with_state(shared_state.clone(), auth::auth_middleware);

    Router::new()
        .route("/sensori", post(register_sensor))
        .route("/batch", post(receive_batch).get(read_batch))
        .route("/batch/mappa-id-hash", get(leaf_hash_map))
        .route("/metadata/misurazione/:id", get(measurement_metadata))
        .route("/metadata/batch/:id", get(batch_metadata))
        .route_layer(auth_mw)
        .with_state(shared_state)
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(API_TIMEOUT)))
}

#[derive(Debug, Deserialize)]
struct BatchIdQuery {
    id: i64,
}

async fn register_sensor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Json(sensor): Json<SensorPayload>,
) -> Result<Response, ApiError> {
    require_writer(&user)?;

    state.pool.sensors_dal().insert_sensor(&sensor).await?;
    tracing::info!("Sensor registered: {}", sensor.sensor_id);

    Ok(Json(serde_json::json!({
        "conferma_ricezione": true,
        "id_sensore": sensor.sensor_id,
        "messaggio": "Sensore registrato correttamente",
    }))
    .into_response())
}

async fn receive_batch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Json(payload): Json<Payload>,
) -> Result<Response, ApiError> {
    require_writer(&user)?;

    let batch_id = payload.batch.batch_id;
    tracing::info!(
        "Receiving batch {batch_id} with {} measurements",
        payload.measurements.len()
    );
    state.pool.batches_dal().insert_payload(&payload).await?;

    Ok(Json(serde_json::json!({
        "conferma_ricezione": true,
        "id_batch": batch_id,
        "messaggio": "Batch salvato correttamente",
    }))
    .into_response())
}

/// `GET /batch?id=`: the reconstructed payload of a stored batch.
async fn read_batch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Query(query): Query<BatchIdQuery>,
) -> Result<Response, ApiError> {
    require_verifier(&user)?;

    let leaf_set = load_leaf_set(&state, query.id).await?;
    Ok(Json(leaf_set.into_payload()).into_response())
}

/// `GET /batch/mappa-id-hash?id=`: leaf hashes recomputed from the
/// stored rows; key `"0"` is the batch leaf.
async fn leaf_hash_map(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Query(query): Query<BatchIdQuery>,
) -> Result<Response, ApiError> {
    require_verifier(&user)?;

    let leaf_set = load_leaf_set(&state, query.id).await?;
    Ok(Json(leaf_set.id_hash_map()).into_response())
}

async fn measurement_metadata(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    require_verifier(&user)?;

    let measurement = state
        .pool
        .batches_dal()
        .get_measurement(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no measurement with id {id}")))?;
    Ok(Json(measurement).into_response())
}

async fn batch_metadata(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<ApiUser>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    require_verifier(&user)?;

    let meta = state
        .pool
        .batches_dal()
        .get_batch_meta(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no batch with id {id}")))?;
    Ok(Json(meta).into_response())
}

async fn load_leaf_set(state: &AppState, batch_id: i64) -> Result<LeafSet, ApiError> {
    let rows = state.pool.batches_dal().load_batch_rows(batch_id).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(format!("no batch with id {batch_id}")));
    }
    LeafSet::from_rows(rows).map_err(|err| ApiError::InternalServerError(err.to_string()))
}
