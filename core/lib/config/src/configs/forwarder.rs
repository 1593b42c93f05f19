use std::time::Duration;

use serde::Deserialize;

fn default_sensor_interval_secs() -> u64 {
    20
}

fn default_sensor_initial_delay_secs() -> u64 {
    5
}

fn default_sensor_batch_limit() -> i64 {
    3
}

fn default_process_interval_secs() -> u64 {
    60
}

fn default_process_initial_delay_secs() -> u64 {
    10
}

fn default_deliver_interval_secs() -> u64 {
    60
}

fn default_deliver_initial_delay_secs() -> u64 {
    5
}

fn default_deliver_batch_limit() -> i64 {
    1
}

/// Cadences and per-tick bounds of the three periodic workers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ForwarderConfig {
    #[serde(default = "default_sensor_interval_secs")]
    pub sensor_interval_secs: u64,
    #[serde(default = "default_sensor_initial_delay_secs")]
    pub sensor_initial_delay_secs: u64,
    /// Unacked sensors forwarded per tick.
    #[serde(default = "default_sensor_batch_limit")]
    pub sensor_batch_limit: i64,

    #[serde(default = "default_process_interval_secs")]
    pub process_interval_secs: u64,
    #[serde(default = "default_process_initial_delay_secs")]
    pub process_initial_delay_secs: u64,

    #[serde(default = "default_deliver_interval_secs")]
    pub deliver_interval_secs: u64,
    #[serde(default = "default_deliver_initial_delay_secs")]
    pub deliver_initial_delay_secs: u64,
    /// Ready batches delivered per tick.
    #[serde(default = "default_deliver_batch_limit")]
    pub deliver_batch_limit: i64,
}

impl ForwarderConfig {
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_secs(self.sensor_interval_secs)
    }

    pub fn sensor_initial_delay(&self) -> Duration {
        Duration::from_secs(self.sensor_initial_delay_secs)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval_secs)
    }

    pub fn process_initial_delay(&self) -> Duration {
        Duration::from_secs(self.process_initial_delay_secs)
    }

    pub fn deliver_interval(&self) -> Duration {
        Duration::from_secs(self.deliver_interval_secs)
    }

    pub fn deliver_initial_delay(&self) -> Duration {
        Duration::from_secs(self.deliver_initial_delay_secs)
    }

    /// Creates a config object suitable for use in unit tests:
    /// everything fires immediately.
    pub fn for_tests() -> Self {
        Self {
            sensor_interval_secs: 1,
            sensor_initial_delay_secs: 0,
            sensor_batch_limit: 3,
            process_interval_secs: 1,
            process_initial_delay_secs: 0,
            deliver_interval_secs: 1,
            deliver_initial_delay_secs: 0,
            deliver_batch_limit: 1,
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            sensor_interval_secs: default_sensor_interval_secs(),
            sensor_initial_delay_secs: default_sensor_initial_delay_secs(),
            sensor_batch_limit: default_sensor_batch_limit(),
            process_interval_secs: default_process_interval_secs(),
            process_initial_delay_secs: default_process_initial_delay_secs(),
            deliver_interval_secs: default_deliver_interval_secs(),
            deliver_initial_delay_secs: default_deliver_initial_delay_secs(),
            deliver_batch_limit: default_deliver_batch_limit(),
        }
    }
}
