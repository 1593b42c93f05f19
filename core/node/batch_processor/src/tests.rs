use std::sync::Arc;

use async_trait::async_trait;
use fogseal_basic_types::BatchNumber;
use fogseal_dal::ConnectionPool;
use fogseal_merkle_tree::{verify_leaf, CompactPath};
use fogseal_object_store::{MockObjectStore, ObjectStore};
use fogseal_types::{LeafSet, Payload, Sensor, SensorKind};
use serde_json::{Map, Value};

use super::*;

#[derive(Debug)]
struct FailingAnchor;

#[async_trait]
impl Anchor for FailingAnchor {
    async fn anchor_root(&self, _: BatchNumber, _: &str, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("anchor store unreachable")
    }
}

async fn sealed_batch_fixture() -> (ConnectionPool, BatchNumber) {
    let pool = ConnectionPool::connect_in_memory().await.unwrap();
    for id in ["JOY001", "TEMP001"] {
        pool.sensors_dal()
            .upsert_sensor(&Sensor {
                sensor_id: id.to_string(),
                kind: SensorKind::from_sensor_id(id),
                description: format!("sensor {id}"),
                ack: false,
            })
            .await
            .unwrap();
    }

    let mut joystick = Map::new();
    joystick.insert("x".to_string(), Value::from(0.5));
    joystick.insert("y".to_string(), Value::from(0_i64));
    joystick.insert("pressed".to_string(), Value::Bool(true));
    let mut temperature = Map::new();
    temperature.insert("valore".to_string(), Value::from(21.0));

    let dal = pool.batches_dal();
    dal.insert_measurement("JOY001", &joystick, 3).await.unwrap();
    dal.insert_measurement("TEMP001", &temperature, 3)
        .await
        .unwrap();
    let sealed = dal
        .insert_measurement("JOY001", &joystick, 3)
        .await
        .unwrap();

    (pool, sealed.sealed_batch.unwrap())
}

fn processor_with(
    pool: &ConnectionPool,
    store: Arc<MockObjectStore>,
    anchor: Arc<dyn Anchor>,
) -> BatchProcessor {
    BatchProcessor::new(pool.clone(), store, anchor, false)
}

#[tokio::test]
async fn pipeline_records_root_cid_and_payload() {
    let (pool, batch) = sealed_batch_fixture().await;
    let store = Arc::new(MockObjectStore::new());
    let processor = processor_with(&pool, store.clone(), Arc::new(NoopAnchor));

    assert!(processor.process_next().await.unwrap());

    let stored = pool.batches_dal().get_batch(batch).await.unwrap().unwrap();
    let root = stored.merkle_root.unwrap();
    let cid = stored.path_cid.unwrap();
    let payload_json = stored.payload_json.unwrap();
    assert!(stored.elaborable);

    // The published paths must verify every leaf against the root.
    let paths_json = store.fetch(&cid).await.unwrap();
    let paths: std::collections::BTreeMap<u64, CompactPath> =
        serde_json::from_str(&paths_json).unwrap();
    assert_eq!(paths.len(), 4);
    assert_eq!(paths[&0].dir.len(), 2);

    let payload: Payload = serde_json::from_str(&payload_json).unwrap();
    let leaf_set = LeafSet::from_payload(payload).unwrap();
    for (id, hash) in leaf_set.id_hash_map() {
        assert!(verify_leaf(hash, &paths[id], &root), "leaf {id} must hold");
    }
}

#[tokio::test]
async fn reprocessing_is_idempotent() {
    let (pool, batch) = sealed_batch_fixture().await;
    let store = Arc::new(MockObjectStore::new());
    let processor = processor_with(&pool, store.clone(), Arc::new(NoopAnchor));

    assert!(processor.process(batch).await.unwrap());
    let first = pool.batches_dal().get_batch(batch).await.unwrap().unwrap();

    // A processed batch stops being selected...
    assert!(!processor.process_next().await.unwrap());

    // ...and a forced re-run recomputes identical artifacts and hits the
    // same content-addressed key.
    assert!(processor.process(batch).await.unwrap());
    let second = pool.batches_dal().get_batch(batch).await.unwrap().unwrap();
    assert_eq!(first.merkle_root, second.merkle_root);
    assert_eq!(first.path_cid, second.path_cid);
    assert_eq!(first.payload_json, second.payload_json);
    assert_eq!(store.put_count(), 2);
}

#[tokio::test]
async fn empty_batch_is_not_processed() {
    let pool = ConnectionPool::connect_in_memory().await.unwrap();
    let processor = processor_with(
        &pool,
        Arc::new(MockObjectStore::new()),
        Arc::new(NoopAnchor),
    );

    assert!(!processor.process(BatchNumber(99)).await.unwrap());
    assert!(!processor.process_next().await.unwrap());
}

#[tokio::test]
async fn dead_object_store_parks_the_batch_as_ipfs() {
    let (pool, batch) = sealed_batch_fixture().await;
    let store = Arc::new(MockObjectStore::new());
    store.set_fail_uploads(true);
    let processor = processor_with(&pool, store, Arc::new(NoopAnchor));

    assert!(!processor.process_next().await.unwrap());

    let stored = pool.batches_dal().get_batch(batch).await.unwrap().unwrap();
    assert!(!stored.elaborable);
    assert_eq!(stored.error_kind.as_deref(), Some("IPFS"));
    assert!(stored.merkle_root.is_none());

    // Parked batches leave every worker's view for good.
    assert_eq!(
        pool.batches_dal().select_sealed_unprocessed().await.unwrap(),
        None
    );
    pool.sensors_dal().ack_sensor("JOY001").await.unwrap();
    pool.sensors_dal().ack_sensor("TEMP001").await.unwrap();
    assert!(pool
        .batches_dal()
        .select_ready_for_delivery(10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn anchor_failure_parks_the_batch_as_blockchain() {
    let (pool, batch) = sealed_batch_fixture().await;
    let processor = processor_with(
        &pool,
        Arc::new(MockObjectStore::new()),
        Arc::new(FailingAnchor),
    );

    assert!(!processor.process(batch).await.unwrap());

    let stored = pool.batches_dal().get_batch(batch).await.unwrap().unwrap();
    assert!(!stored.elaborable);
    assert_eq!(stored.error_kind.as_deref(), Some("BLOCKCHAIN"));
    // Artifacts were recorded before the anchor step.
    assert!(stored.merkle_root.is_some());
}
