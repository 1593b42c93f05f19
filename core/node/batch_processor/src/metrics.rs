use std::time::Duration;

use vise::{Buckets, Counter, Gauge, Histogram, Metrics, Unit};

const UPLOAD_LATENCIES: Buckets = Buckets::values(&[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);

#[derive(Debug, Metrics)]
#[metrics(prefix = "fogseal_batch_processor")]
pub(crate) struct BatchProcessorMetrics {
    /// Latency of the Merkle path upload to the object store.
    #[metrics(buckets = UPLOAD_LATENCIES, unit = Unit::Seconds)]
    pub path_upload_latency: Histogram<Duration>,
    /// Size of the uploaded paths blob.
    #[metrics(buckets = Buckets::exponential(1_024.0..=16.0 * 1_024.0 * 1_024.0, 2.0), unit = Unit::Bytes)]
    pub paths_blob_size: Histogram<usize>,
    /// Last batch that completed the processing pipeline.
    pub last_processed_batch: Gauge<usize>,
    /// Batches parked as non-elaborable by this processor.
    pub fatal_errors: Counter,
    /// Recoverable errors (retried on the next tick).
    pub transient_errors: Counter,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<BatchProcessorMetrics> = vise::Global::new();
