//! Engine configuration.
//!
//! [`EngineConfig`] is built once at startup and handed to the pool; nothing
//! reads it from global state. Values come from an optional TOML/YAML/JSON
//! file, overridden by `SENSORWATCH_*` environment variables:
//!
//! ```toml
//! default_interval = "10m"
//! default_threshold = 0.5
//! self_report_interval = "15m"
//! fetch_timeout = "5s"
//! max_concurrent_polls = 8
//! sweep_interval = 60
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::duration::parse_duration;

/// Tunables shared by every poller in a pool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Poll interval for sensors with no explicit interval.
    #[serde(deserialize_with = "deserialize_duration")]
    pub default_interval: Duration,

    /// Alert threshold for sensors with no explicit threshold.
    pub default_threshold: f64,

    /// How often each module reports its own poll statistics.
    #[serde(deserialize_with = "deserialize_duration")]
    pub self_report_interval: Duration,

    /// Upper bound on a single module fetch.
    #[serde(deserialize_with = "deserialize_duration")]
    pub fetch_timeout: Duration,

    /// Maximum module fetches in flight during one sweep.
    pub max_concurrent_polls: usize,

    /// Cadence of the driver loop in the CLI.
    #[serde(deserialize_with = "deserialize_duration")]
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_interval: Duration::from_secs(10 * 60),
            default_threshold: 0.50,
            self_report_interval: Duration::from_secs(15 * 60),
            fetch_timeout: Duration::from_secs(5),
            max_concurrent_polls: 8,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Load from an optional file plus `SENSORWATCH_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config: EngineConfig = builder
            .add_source(Environment::with_prefix("SENSORWATCH"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.default_threshold) {
            return Err(ConfigError::Message(format!(
                "default_threshold must be in [0, 1), got {}",
                self.default_threshold
            )));
        }
        if self.max_concurrent_polls == 0 {
            return Err(ConfigError::Message(
                "max_concurrent_polls must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Message(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Message(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Fractional(f64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Fractional(secs) if secs.is_finite() && secs >= 0.0 => {
            Ok(Duration::from_secs_f64(secs))
        }
        RawDuration::Fractional(secs) => Err(serde::de::Error::custom(format!(
            "invalid duration: {}",
            secs
        ))),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
