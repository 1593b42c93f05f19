use fogseal_cloud_client::CloudClient;
use fogseal_config::ForwarderConfig;
use fogseal_dal::ConnectionPool;
use fogseal_types::SensorPayload;
use tokio::sync::watch;

use crate::metrics::METRICS;

/// Pushes locally registered sensors to the cloud until each one is
/// confirmed. Sensors must land before any batch that references them,
/// which delivery enforces by gating on the sensor ack.
#[derive(Debug)]
pub struct SensorForwarder {
    pool: ConnectionPool,
    client: CloudClient,
    config: ForwarderConfig,
}

impl SensorForwarder {
    pub fn new(pool: ConnectionPool, client: CloudClient, config: ForwarderConfig) -> Self {
        Self {
            pool,
            client,
            config,
        }
    }

    pub async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> anyhow::Result<()> {
        if tokio::time::timeout(self.config.sensor_initial_delay(), stop_receiver.changed())
            .await
            .is_ok()
        {
            return Ok(());
        }

        let mut timer = tokio::time::interval(self.config.sensor_interval());
        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => { /* continue iterations */ }
                _ = stop_receiver.changed() => break,
            }

            if let Err(err) = self.loop_iteration().await {
                tracing::error!("Failed to forward sensors: {err:#}");
            }
        }

        tracing::info!("Stop signal received, sensor forwarder is shutting down");
        Ok(())
    }

    pub(crate) async fn loop_iteration(&self) -> anyhow::Result<()> {
        let sensors = self
            .pool
            .sensors_dal()
            .select_unacked_sensors(self.config.sensor_batch_limit)
            .await?;

        for sensor in sensors {
            match self.client.register_sensor(&SensorPayload::from(&sensor)).await {
                Ok(ack) if ack.confirmed => {
                    self.pool.sensors_dal().ack_sensor(&sensor.sensor_id).await?;
                    METRICS.sensors_acked.inc();
                    tracing::info!("Sensor {} confirmed by the cloud", sensor.sensor_id);
                }
                Ok(_) => {
                    tracing::warn!(
                        "Cloud did not confirm sensor {}, retrying next tick",
                        sensor.sensor_id
                    );
                }
                Err(err) => {
                    // Cloud unreachable: stop hammering it and wait for
                    // the next tick.
                    METRICS.cloud_failures.inc();
                    tracing::warn!(
                        "Sensor registration of {} failed ({err}), breaking out until next tick",
                        sensor.sensor_id
                    );
                    break;
                }
            }
        }
        Ok(())
    }
}
