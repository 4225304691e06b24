//! Errors raised while building a checker pool.

use thiserror::Error;

use crate::store::{DbId, StoreError};

/// Pool initialization failure. Sweeps themselves never fail.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The configuration store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A sensor did not resolve to exactly one settings row.
    #[error("sensor {sensor_id} has {rows} tracked settings rows, expected exactly 1")]
    SensorConfig { sensor_id: DbId, rows: usize },

    /// The engine configuration is unusable.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_config_display() {
        let err = PoolError::SensorConfig {
            sensor_id: 42,
            rows: 0,
        };
        assert_eq!(
            err.to_string(),
            "sensor 42 has 0 tracked settings rows, expected exactly 1"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: PoolError = StoreError::Unavailable("db down".to_string()).into();
        assert_eq!(err.to_string(), "configuration store unavailable: db down");
    }
}
