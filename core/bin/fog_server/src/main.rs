use std::sync::Arc;

use anyhow::Context as _;
use fogseal_batch_processor::{BatchProcessor, NoopAnchor};
use fogseal_cloud_client::CloudClient;
use fogseal_config::{
    CloudConfig, ForwarderConfig, FromEnv, IngressConfig, LocalStoreConfig, ObjectStoreConfig,
};
use fogseal_dal::ConnectionPool;
use fogseal_forwarder::{BatchDeliverer, ProcessorRunner, SensorForwarder};
use fogseal_ingress::AppState;
use fogseal_object_store::{FilebaseStore, ObjectStore};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store_config = LocalStoreConfig::from_env().context("local store config")?;
    let ingress_config = IngressConfig::from_env().context("ingress config")?;
    let cloud_config = CloudConfig::from_env().context("cloud config")?;
    let object_store_config = ObjectStoreConfig::from_env().context("object store config")?;
    let forwarder_config = ForwarderConfig::from_env().context("forwarder config")?;

    let pool = ConnectionPool::connect(&store_config.database_url)
        .await
        .context("failed to open the local store")?;
    let object_store: Arc<dyn ObjectStore> = Arc::new(FilebaseStore::new(&object_store_config)?);
    let cloud_client = CloudClient::new(&cloud_config)?;
    let processor = BatchProcessor::new(
        pool.clone(),
        object_store,
        Arc::new(NoopAnchor),
        object_store_config.gzip,
    );

    let (stop_sender, _) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(&ingress_config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", ingress_config.bind_addr))?;
    tracing::info!("Fog API listening on {}", ingress_config.bind_addr);
    let router = fogseal_ingress::router(AppState {
        pool: pool.clone(),
        batch_threshold: store_config.batch_threshold,
    });
    let mut server_stop = stop_sender.subscribe();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_stop.changed().await;
            })
            .await
            .context("ingress server failed")
    });

    let sensor_forwarder = SensorForwarder::new(
        pool.clone(),
        cloud_client.clone(),
        forwarder_config.clone(),
    );
    let processor_runner = ProcessorRunner::new(processor, forwarder_config.clone());
    let deliverer = BatchDeliverer::new(pool.clone(), cloud_client, forwarder_config);

    let tasks = vec![
        tokio::spawn(sensor_forwarder.run(stop_sender.subscribe())),
        tokio::spawn(processor_runner.run(stop_sender.subscribe())),
        tokio::spawn(deliverer.run(stop_sender.subscribe())),
        server_task,
    ];

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    tracing::info!("Shutdown signal received, stopping workers");
    stop_sender.send(true).ok();

    for task in tasks {
        task.await.context("task panicked")??;
    }

    // Workers are down before the store closes.
    pool.close().await;
    tracing::info!("Fog node stopped");
    Ok(())
}
