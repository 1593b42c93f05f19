use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fogseal_basic_types::ErrorKind;
use fogseal_dal::ConnectionPool;
use tower::ServiceExt;

use super::*;

async fn test_router(threshold: i64) -> (Router, ConnectionPool) {
    let pool = ConnectionPool::connect_in_memory().await.unwrap();
    let router = router(AppState {
        pool: pool.clone(),
        batch_threshold: threshold,
    });
    (router, pool)
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn sensor_registration_uppercases_and_derives_the_kind() {
    let (router, pool) = test_router(3).await;

    let response = router
        .oneshot(post_json(
            "/sensori",
            r#"{"id_sensore":"joy001","descrizione":"cabin joystick"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id_sensore"], "JOY001");
    assert_eq!(body["tipo"], "joystick");

    let stored = pool.sensors_dal().get_sensor("JOY001").await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn malformed_sensor_ids_are_rejected() {
    let (router, _pool) = test_router(3).await;

    let response = router
        .oneshot(post_json(
            "/sensori",
            r#"{"id_sensore":"ROBOT9000","descrizione":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn measurement_is_bound_to_the_open_batch_and_echoes_the_timestamp() {
    let (router, pool) = test_router(3).await;
    router
        .clone()
        .oneshot(post_json(
            "/sensori",
            r#"{"id_sensore":"JOY001","descrizione":"joystick"}"#,
        ))
        .await
        .unwrap();

    let response = router
        .oneshot(post_json(
            "/misurazioni",
            r#"{"tipo":"joystick","id_sensore":"JOY001","x":0.5,"y":0.0,"pressed":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id_misurazione"], 1);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));

    let rows = pool
        .batches_dal()
        .load_batch_rows(fogseal_basic_types::BatchNumber(1))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    // Zero floats were normalized before persistence.
    assert!(rows[0].data_json.contains(r#""y":0"#));
}

#[tokio::test]
async fn unknown_sensor_is_a_store_error() {
    let (router, pool) = test_router(3).await;

    let response = router
        .oneshot(post_json(
            "/misurazioni",
            r#"{"tipo":"temperatura","id_sensore":"TEMP001","valore":21.0}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The failed insert created no batch.
    assert!(pool
        .batches_dal()
        .get_batch(fogseal_basic_types::BatchNumber(1))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn threshold_reached_on_an_insert_seals_the_batch() {
    let (router, pool) = test_router(1).await;
    router
        .clone()
        .oneshot(post_json(
            "/sensori",
            r#"{"id_sensore":"TEMP001","descrizione":"probe"}"#,
        ))
        .await
        .unwrap();

    let response = router
        .oneshot(post_json(
            "/misurazioni",
            r#"{"tipo":"temperatura","id_sensore":"TEMP001","valore":21.0}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let batch = pool
        .batches_dal()
        .get_batch(fogseal_basic_types::BatchNumber(1))
        .await
        .unwrap()
        .unwrap();
    assert!(batch.complete);
    assert_eq!(batch.measurement_count, 1);
}

#[tokio::test]
async fn parked_batches_are_listed_with_their_diagnostics() {
    let (router, pool) = test_router(1).await;
    router
        .clone()
        .oneshot(post_json(
            "/sensori",
            r#"{"id_sensore":"TEMP001","descrizione":"probe"}"#,
        ))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(post_json(
            "/misurazioni",
            r#"{"tipo":"temperatura","id_sensore":"TEMP001","valore":21.0}"#,
        ))
        .await
        .unwrap();
    pool.batches_dal()
        .mark_batch_error(
            fogseal_basic_types::BatchNumber(1),
            ErrorKind::Ipfs,
            "upload failed",
        )
        .await
        .unwrap();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/batch/non-elaborabili")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body[0]["batch_id"], 1);
    assert_eq!(body[0]["error_kind"], "IPFS");
}
