//! Configuration store abstraction.
//!
//! The topology (hosts, their sensor modules, and the sensors tracked on each
//! module) lives in a relational store that is read once at startup. This
//! module provides a common trait over the concrete backends:
//!
//! - [`FileStore`] - tables kept in a TOML/YAML/JSON topology file
//! - `MySqlStore` - the `host`/`sensor_module`/`sensor` tables in MySQL
//!   (requires the `mysql` feature)

mod file;
#[cfg(feature = "mysql")]
mod mysql;

pub use file::{FileStore, ModuleEntry, SensorEntry, Topology};
#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Row identifier in the configuration store.
pub type DbId = i64;

/// A hardware unit reachable over the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct HostRecord {
    pub id: DbId,
    /// Hostname or IP, optionally with a scheme.
    pub address: String,
}

/// A sensor module attached to a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct ModuleRecord {
    pub id: DbId,
    /// Identifier the reading source knows the module by.
    pub module_name: String,
    /// Human-friendly name used to prefix readings.
    pub display_name: Option<String>,
    pub track_data: bool,
}

impl ModuleRecord {
    /// Display name, falling back to the module name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.module_name)
    }
}

/// A sensor tracked on a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mysql", derive(sqlx::FromRow))]
pub struct SensorRecord {
    pub id: DbId,
    pub sensor_name: String,
}

/// Per-sensor overrides. `None` means "use the engine default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSettings {
    pub poll_interval_secs: Option<u64>,
    pub alert_threshold: Option<f64>,
}

/// Errors raised while reading the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load topology: {0}")]
    Config(#[from] config::ConfigError),

    #[cfg(feature = "mysql")]
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the polling topology.
///
/// Only queried while a pool is being initialized.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Every configured host.
    async fn hosts(&self) -> Result<Vec<HostRecord>, StoreError>;

    /// Modules on `host_id` with tracking enabled.
    async fn tracked_modules(&self, host_id: DbId) -> Result<Vec<ModuleRecord>, StoreError>;

    /// Sensors on `module_id` with tracking enabled.
    async fn tracked_sensors(&self, module_id: DbId) -> Result<Vec<SensorRecord>, StoreError>;

    /// Every tracked settings row for `sensor_id`. A consistent store returns
    /// exactly one.
    async fn sensor_settings(&self, sensor_id: DbId) -> Result<Vec<SensorSettings>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_label_fallback() {
        let mut module = ModuleRecord {
            id: 1,
            module_name: "nbSensorPod_1A2B".to_string(),
            display_name: Some("ServerRoom".to_string()),
            track_data: true,
        };
        assert_eq!(module.label(), "ServerRoom");

        module.display_name = Some(String::new());
        assert_eq!(module.label(), "nbSensorPod_1A2B");

        module.display_name = None;
        assert_eq!(module.label(), "nbSensorPod_1A2B");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("topology.toml not found".to_string());
        assert_eq!(
            err.to_string(),
            "configuration store unavailable: topology.toml not found"
        );
    }
}
