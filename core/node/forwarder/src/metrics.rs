use vise::{Counter, Gauge, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "fogseal_forwarder")]
pub(crate) struct ForwarderMetrics {
    /// Sensors confirmed by the cloud.
    pub sensors_acked: Counter,
    /// Batches confirmed by the cloud.
    pub batches_acked: Counter,
    /// Last batch the cloud confirmed.
    pub last_acked_batch: Gauge<usize>,
    /// Ticks aborted early because the cloud was unreachable.
    pub cloud_failures: Counter,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<ForwarderMetrics> = vise::Global::new();
