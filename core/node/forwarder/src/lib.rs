//! The three periodic workers of the fog node.
//!
//! Each worker owns its cursor into the local store through SQL filters
//! alone: no in-memory queues, no shared state between workers. All
//! three stop cooperatively through the process-wide `watch` channel.
//!
//! | worker | action | cadence |
//! |---|---|---|
//! | `SensorForwarder` | push unacked sensors to the cloud | 20 s, first run after 5 s |
//! | `ProcessorRunner` | run the batch pipeline on one sealed batch | 60 s, first run after 10 s |
//! | `BatchDeliverer` | deliver processed batches, flip acks | 60 s, first run after 5 s |

pub use crate::{
    deliverer::BatchDeliverer, processor_runner::ProcessorRunner, sensor_forwarder::SensorForwarder,
};

mod deliverer;
mod metrics;
mod processor_runner;
mod sensor_forwarder;
