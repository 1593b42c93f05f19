use fogseal_cloud_client::CloudClient;
use fogseal_config::ForwarderConfig;
use fogseal_dal::ConnectionPool;
use tokio::sync::watch;

use crate::metrics::METRICS;

/// Delivers processed batches to the cloud with at-least-once semantics:
/// a batch leaves the candidate set only when the cloud answers with an
/// explicit confirmation, and the cloud ignores duplicate payloads.
#[derive(Debug)]
pub struct BatchDeliverer {
    pool: ConnectionPool,
    client: CloudClient,
    config: ForwarderConfig,
}

impl BatchDeliverer {
    pub fn new(pool: ConnectionPool, client: CloudClient, config: ForwarderConfig) -> Self {
        Self {
            pool,
            client,
            config,
        }
    }

    pub async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> anyhow::Result<()> {
        if tokio::time::timeout(self.config.deliver_initial_delay(), stop_receiver.changed())
            .await
            .is_ok()
        {
            return Ok(());
        }

        let mut timer = tokio::time::interval(self.config.deliver_interval());
        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => { /* continue iterations */ }
                _ = stop_receiver.changed() => break,
            }

            if let Err(err) = self.loop_iteration().await {
                tracing::error!("Failed to deliver batches: {err:#}");
            }
        }

        tracing::info!("Stop signal received, batch deliverer is shutting down");
        Ok(())
    }

    pub(crate) async fn loop_iteration(&self) -> anyhow::Result<()> {
        let ready = self
            .pool
            .batches_dal()
            .select_ready_for_delivery(self.config.deliver_batch_limit)
            .await?;

        for (batch, payload_json) in ready {
            match self.client.submit_batch(&payload_json).await {
                Ok(ack) if ack.confirmed => {
                    self.pool.batches_dal().ack_batch(batch).await?;
                    METRICS.batches_acked.inc();
                    METRICS.last_acked_batch.set(batch.0 as usize);
                    tracing::info!("Batch {batch} confirmed by the cloud");
                }
                Ok(_) => {
                    tracing::warn!("Cloud did not confirm batch {batch}, retrying next tick");
                }
                Err(err) => {
                    METRICS.cloud_failures.inc();
                    tracing::warn!(
                        "Delivery of batch {batch} failed ({err}), breaking out until next tick"
                    );
                    break;
                }
            }
        }
        Ok(())
    }
}
