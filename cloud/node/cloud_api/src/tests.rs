use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fogseal_cloud_dal::CloudConnectionPool;
use fogseal_config::CloudApiConfig;
use fogseal_crypto::canonical_hash;
use tower::ServiceExt;

use super::*;

const PRODUCER_KEY: &str = "test-producer-key";
const VERIFIER_KEY: &str = "test-verifier-key";

async fn test_router() -> (Router, CloudConnectionPool) {
    let pool = CloudConnectionPool::connect_in_memory().await.unwrap();
    let state = AppState::new(pool.clone(), &CloudApiConfig::for_tests()).unwrap();
    (router(state), pool)
}

fn request(method: &str, uri: &str, api_key: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const SENSOR_BODY: &str = r#"{"id_sensore":"JOY001","descrizione":"cabin joystick"}"#;
const BATCH_BODY: &str = concat!(
    r#"{"batch":{"id_batch":1,"timestamp_creazione":"2026-08-01T09:00:00","numero_misurazioni":1},"#,
    r#""misurazioni":[{"id_misurazione":1,"id_sensore":"JOY001","#,
    r#""timestamp":"2026-08-01T09:00:01","dati":{"pressed":true,"x":0.5,"y":0}}]}"#,
);

async fn seed_batch(router: &Router) {
    let response = router
        .clone()
        .oneshot(request("POST", "/sensori", Some(PRODUCER_KEY), Some(SENSOR_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(request("POST", "/batch", Some(PRODUCER_KEY), Some(BATCH_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_without_a_key_are_unauthorized() {
    let (router, _pool) = test_router().await;
    let response = router
        .oneshot(request("POST", "/sensori", None, Some(SENSOR_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_keys_are_unauthorized() {
    let (router, _pool) = test_router().await;
    let response = router
        .oneshot(request("POST", "/sensori", Some("wrong"), Some(SENSOR_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn the_verifier_role_cannot_write() {
    let (router, _pool) = test_router().await;
    let response = router
        .oneshot(request("POST", "/sensori", Some(VERIFIER_KEY), Some(SENSOR_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn sensor_write_confirms_reception() {
    let (router, _pool) = test_router().await;
    let response = router
        .oneshot(request("POST", "/sensori", Some(PRODUCER_KEY), Some(SENSOR_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["conferma_ricezione"], true);
    assert_eq!(body["id_sensore"], "JOY001");
}

#[tokio::test]
async fn batch_write_is_idempotent_and_confirms_the_id() {
    let (router, pool) = test_router().await;
    seed_batch(&router).await;

    // A duplicate delivery is accepted and changes nothing.
    let response = router
        .clone()
        .oneshot(request("POST", "/batch", Some(PRODUCER_KEY), Some(BATCH_BODY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["conferma_ricezione"], true);
    assert_eq!(body["id_batch"], 1);

    assert_eq!(pool.batches_dal().load_batch_rows(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn leaf_hash_map_matches_a_local_recomputation() {
    let (router, _pool) = test_router().await;
    seed_batch(&router).await;

    let response = router
        .clone()
        .oneshot(request("GET", "/batch/mappa-id-hash?id=1", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let map = body_json(response).await;

    let expected_batch_leaf = canonical_hash(&serde_json::json!({
        "id_batch": 1,
        "numero_misurazioni": 1,
        "timestamp_creazione": "2026-08-01T09:00:00",
    }))
    .unwrap();
    let expected_measurement_leaf = canonical_hash(&serde_json::json!({
        "id_misurazione": 1,
        "id_sensore": "JOY001",
        "timestamp": "2026-08-01T09:00:01",
        "dati": {"pressed": true, "x": 0.5, "y": 0},
    }))
    .unwrap();

    assert_eq!(map["0"], expected_batch_leaf.as_str());
    assert_eq!(map["1"], expected_measurement_leaf.as_str());

    // The producer key implies the verifier permission.
    let response = router
        .oneshot(request("GET", "/batch/mappa-id-hash?id=1", Some(PRODUCER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stored_payload_reads_back_canonically_equal() {
    let (router, _pool) = test_router().await;
    seed_batch(&router).await;

    let response = router
        .oneshot(request("GET", "/batch?id=1", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let returned = body_json(response).await;
    let submitted: serde_json::Value = serde_json::from_str(BATCH_BODY).unwrap();
    assert_eq!(
        fogseal_crypto::canonical_json(&returned).unwrap(),
        fogseal_crypto::canonical_json(&submitted).unwrap()
    );
}

#[tokio::test]
async fn metadata_endpoints_serve_single_rows() {
    let (router, _pool) = test_router().await;
    seed_batch(&router).await;

    let response = router
        .clone()
        .oneshot(request("GET", "/metadata/misurazione/1", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let measurement = body_json(response).await;
    assert_eq!(measurement["id_misurazione"], 1);
    assert_eq!(measurement["dati"]["x"], 0.5);

    let response = router
        .clone()
        .oneshot(request("GET", "/metadata/batch/1", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let meta = body_json(response).await;
    assert_eq!(meta["numero_misurazioni"], 1);

    let response = router
        .oneshot(request("GET", "/metadata/batch/99", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_batches_are_not_found() {
    let (router, _pool) = test_router().await;
    let response = router
        .oneshot(request("GET", "/batch/mappa-id-hash?id=5", Some(VERIFIER_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
