use serde::Deserialize;

fn default_batch_threshold() -> i64 {
    1023
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LocalStoreConfig {
    /// SQLite URL of the producer's durable store.
    pub database_url: String,

    /// Number of measurements that seals a batch. `threshold + 1`
    /// (measurements plus the batch leaf) must be a power of two.
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: i64,
}

impl LocalStoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let leaves = self.batch_threshold + 1;
        if self.batch_threshold < 1 || !(leaves as u64).is_power_of_two() {
            anyhow::bail!(
                "batch_threshold {} is invalid: threshold + 1 must be a power of two",
                self.batch_threshold
            );
        }
        Ok(())
    }

    /// Creates a config object suitable for use in unit tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            batch_threshold: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_plus_one_must_be_a_power_of_two() {
        for valid in [1, 3, 7, 63, 511, 1023] {
            let config = LocalStoreConfig {
                batch_threshold: valid,
                ..LocalStoreConfig::for_tests()
            };
            assert!(config.validate().is_ok(), "{valid} must be accepted");
        }
        for invalid in [0, 2, 4, 1000, 1024, -1] {
            let config = LocalStoreConfig {
                batch_threshold: invalid,
                ..LocalStoreConfig::for_tests()
            };
            assert!(config.validate().is_err(), "{invalid} must be rejected");
        }
    }
}
