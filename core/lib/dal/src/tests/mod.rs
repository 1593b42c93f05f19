use assert_matches::assert_matches;
use fogseal_basic_types::{BatchNumber, ErrorKind};
use fogseal_types::{Sensor, SensorKind};
use serde_json::{Map, Value};

use crate::{batches_dal::InsertMeasurementError, ConnectionPool};

fn sensor(id: &str) -> Sensor {
    Sensor {
        sensor_id: id.to_string(),
        kind: SensorKind::from_sensor_id(id),
        description: format!("test sensor {id}"),
        ack: false,
    }
}

fn joystick_data() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("x".to_string(), Value::from(0.5));
    data.insert("y".to_string(), Value::from(0_i64));
    data.insert("pressed".to_string(), Value::Bool(true));
    data
}

async fn pool_with_sensors(ids: &[&str]) -> ConnectionPool {
    let pool = ConnectionPool::connect_in_memory().await.unwrap();
    for id in ids {
        pool.sensors_dal().upsert_sensor(&sensor(id)).await.unwrap();
    }
    pool
}

#[tokio::test]
async fn upsert_sensor_is_insert_or_ignore() {
    let pool = ConnectionPool::connect_in_memory().await.unwrap();
    let dal = pool.sensors_dal();

    assert!(dal.upsert_sensor(&sensor("JOY001")).await.unwrap());
    assert!(!dal.upsert_sensor(&sensor("JOY001")).await.unwrap());

    let stored = dal.get_sensor("JOY001").await.unwrap().unwrap();
    assert_eq!(stored.kind, SensorKind::Joystick);
    assert!(!stored.ack);
}

#[tokio::test]
async fn sensor_ack_is_monotonic() {
    let pool = pool_with_sensors(&["TEMP001"]).await;
    let dal = pool.sensors_dal();

    assert_eq!(dal.select_unacked_sensors(5).await.unwrap().len(), 1);
    dal.ack_sensor("TEMP001").await.unwrap();
    dal.ack_sensor("TEMP001").await.unwrap();
    assert!(dal.select_unacked_sensors(5).await.unwrap().is_empty());
    assert!(dal.get_sensor("TEMP001").await.unwrap().unwrap().ack);
}

#[tokio::test]
async fn measurements_accumulate_into_one_open_batch() {
    let pool = pool_with_sensors(&["JOY001"]).await;
    let dal = pool.batches_dal();

    let first = dal
        .insert_measurement("JOY001", &joystick_data(), 3)
        .await
        .unwrap();
    let second = dal
        .insert_measurement("JOY001", &joystick_data(), 3)
        .await
        .unwrap();

    assert_eq!(first.batch, second.batch);
    assert_eq!(first.measurement_id, 1);
    assert_eq!(second.measurement_id, 2);
    assert_eq!(first.sealed_batch, None);

    let batch = dal.get_batch(first.batch).await.unwrap().unwrap();
    assert_eq!(batch.measurement_count, 2);
    assert!(!batch.complete);
}

#[tokio::test]
async fn reaching_the_threshold_seals_the_batch() {
    let pool = pool_with_sensors(&["JOY001"]).await;
    let dal = pool.batches_dal();

    for _ in 0..2 {
        dal.insert_measurement("JOY001", &joystick_data(), 3)
            .await
            .unwrap();
    }
    let third = dal
        .insert_measurement("JOY001", &joystick_data(), 3)
        .await
        .unwrap();
    assert_eq!(third.sealed_batch, Some(third.batch));

    let batch = dal.get_batch(third.batch).await.unwrap().unwrap();
    assert!(batch.complete);
    assert_eq!(batch.measurement_count, 3);

    // The next insert opens a fresh batch.
    let fourth = dal
        .insert_measurement("JOY001", &joystick_data(), 3)
        .await
        .unwrap();
    assert_eq!(fourth.batch, third.batch + 1);
}

#[tokio::test]
async fn unknown_sensor_leaves_no_state_behind() {
    let pool = pool_with_sensors(&[]).await;
    let dal = pool.batches_dal();

    let err = dal
        .insert_measurement("JOY999", &joystick_data(), 3)
        .await
        .unwrap_err();
    assert_matches!(err, InsertMeasurementError::UnknownSensor(id) if id == "JOY999");

    // No batch was created by the failed insert.
    assert_eq!(dal.select_sealed_unprocessed().await.unwrap(), None);
    assert!(dal.get_batch(BatchNumber(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn sealed_unprocessed_selection_prefers_the_smallest_batch() {
    let pool = pool_with_sensors(&["JOY001"]).await;
    let dal = pool.batches_dal();

    // Seal two batches of one measurement each.
    let first = dal
        .insert_measurement("JOY001", &joystick_data(), 1)
        .await
        .unwrap();
    let second = dal
        .insert_measurement("JOY001", &joystick_data(), 1)
        .await
        .unwrap();

    assert_eq!(
        dal.select_sealed_unprocessed().await.unwrap(),
        Some(first.batch)
    );

    dal.record_batch_artifacts(first.batch, "root", "cid", "{}")
        .await
        .unwrap();
    assert_eq!(
        dal.select_sealed_unprocessed().await.unwrap(),
        Some(second.batch)
    );
}

#[tokio::test]
async fn delivery_waits_for_sensor_acks() {
    let pool = pool_with_sensors(&["JOY001", "TEMP001"]).await;
    let dal = pool.batches_dal();

    dal.insert_measurement("JOY001", &joystick_data(), 2)
        .await
        .unwrap();
    let sealed = dal
        .insert_measurement("TEMP001", &joystick_data(), 2)
        .await
        .unwrap();
    dal.record_batch_artifacts(sealed.batch, "root", "cid", r#"{"batch":{}}"#)
        .await
        .unwrap();

    // Only one of the two referenced sensors is acked: still held back.
    pool.sensors_dal().ack_sensor("JOY001").await.unwrap();
    assert!(dal.select_ready_for_delivery(10).await.unwrap().is_empty());

    pool.sensors_dal().ack_sensor("TEMP001").await.unwrap();
    let ready = dal.select_ready_for_delivery(10).await.unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].0, sealed.batch);
    assert_eq!(ready[0].1, r#"{"batch":{}}"#);
}

#[tokio::test]
async fn non_elaborable_batches_are_never_selected() {
    let pool = pool_with_sensors(&["JOY001"]).await;
    let dal = pool.batches_dal();
    pool.sensors_dal().ack_sensor("JOY001").await.unwrap();

    let sealed = dal
        .insert_measurement("JOY001", &joystick_data(), 1)
        .await
        .unwrap();
    dal.mark_batch_error(sealed.batch, ErrorKind::Ipfs, "upload failed")
        .await
        .unwrap();

    assert_eq!(dal.select_sealed_unprocessed().await.unwrap(), None);
    assert!(dal.select_ready_for_delivery(10).await.unwrap().is_empty());

    let parked = dal.list_non_elaborable().await.unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].error_kind.as_deref(), Some("IPFS"));
    assert_eq!(parked[0].error_message.as_deref(), Some("upload failed"));
}

#[tokio::test]
async fn batch_ack_requires_a_sealed_batch_and_is_monotonic() {
    let pool = pool_with_sensors(&["JOY001"]).await;
    let dal = pool.batches_dal();

    let open = dal
        .insert_measurement("JOY001", &joystick_data(), 2)
        .await
        .unwrap();
    dal.ack_batch(open.batch).await.unwrap();
    assert!(!dal.get_batch(open.batch).await.unwrap().unwrap().ack);

    let sealed = dal
        .insert_measurement("JOY001", &joystick_data(), 2)
        .await
        .unwrap();
    assert_eq!(sealed.sealed_batch, Some(open.batch));
    dal.ack_batch(open.batch).await.unwrap();
    dal.ack_batch(open.batch).await.unwrap();
    assert!(dal.get_batch(open.batch).await.unwrap().unwrap().ack);
}

#[tokio::test]
async fn batch_rows_come_back_joined_and_ordered() {
    let pool = pool_with_sensors(&["JOY001", "TEMP001"]).await;
    let dal = pool.batches_dal();

    dal.insert_measurement("JOY001", &joystick_data(), 2)
        .await
        .unwrap();
    let sealed = dal
        .insert_measurement("TEMP001", &joystick_data(), 2)
        .await
        .unwrap();

    let rows = dal.load_batch_rows(sealed.batch).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].measurement_id, 1);
    assert_eq!(rows[0].sensor_id, "JOY001");
    assert_eq!(rows[1].measurement_id, 2);
    assert_eq!(rows[1].sensor_id, "TEMP001");
    assert_eq!(rows[0].measurement_count, 2);
    assert!(rows[0].data_json.contains("\"pressed\""));

    assert!(dal
        .load_batch_rows(sealed.batch + 1)
        .await
        .unwrap()
        .is_empty());
}
