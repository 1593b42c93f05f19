use fogseal_batch_processor::BatchProcessor;
use fogseal_config::ForwarderConfig;
use tokio::sync::watch;

/// Drives the batch processor: one sealed batch per tick. Sealing (in
/// the ingress transaction) and processing stay decoupled; this worker
/// is the only caller of the pipeline.
#[derive(Debug)]
pub struct ProcessorRunner {
    processor: BatchProcessor,
    config: ForwarderConfig,
}

impl ProcessorRunner {
    pub fn new(processor: BatchProcessor, config: ForwarderConfig) -> Self {
        Self { processor, config }
    }

    pub async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> anyhow::Result<()> {
        if tokio::time::timeout(self.config.process_initial_delay(), stop_receiver.changed())
            .await
            .is_ok()
        {
            return Ok(());
        }

        let mut timer = tokio::time::interval(self.config.process_interval());
        while !*stop_receiver.borrow_and_update() {
            tokio::select! {
                _ = timer.tick() => { /* continue iterations */ }
                _ = stop_receiver.changed() => break,
            }

            match self.processor.process_next().await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("No sealed batch ready for processing"),
                // Recoverable store failure: the batch stays selectable.
                Err(err) => tracing::error!("Batch processing failed: {err:#}"),
            }
        }

        tracing::info!("Stop signal received, processor runner is shutting down");
        Ok(())
    }
}
