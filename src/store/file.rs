//! File-backed configuration store.

use std::path::Path;

use async_trait::async_trait;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::{ConfigStore, DbId, HostRecord, ModuleRecord, SensorRecord, SensorSettings, StoreError};

/// One row of the `modules` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub id: DbId,
    /// Owning host id.
    pub host: DbId,
    pub module_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "tracked")]
    pub track_data: bool,
}

/// One row of the `sensors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub id: DbId,
    /// Owning module id.
    pub module: DbId,
    pub sensor_name: String,
    /// Seconds between scheduled polls.
    #[serde(default)]
    pub poll_interval: Option<u64>,
    #[serde(default)]
    pub alert_threshold: Option<f64>,
    #[serde(default = "tracked")]
    pub track_data: bool,
}

fn tracked() -> bool {
    true
}

/// The three topology tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub hosts: Vec<HostRecord>,
    pub modules: Vec<ModuleEntry>,
    pub sensors: Vec<SensorEntry>,
}

/// Topology kept in a local file.
///
/// # Example
///
/// ```toml
/// [[hosts]]
/// id = 1
/// address = "10.0.0.5"
///
/// [[modules]]
/// id = 10
/// host = 1
/// module_name = "nbSensorPod_1A2B"
/// display_name = "ServerRoom"
///
/// [[sensors]]
/// id = 100
/// module = 10
/// sensor_name = "Temperature"
/// poll_interval = 300
/// alert_threshold = 0.1
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    topology: Topology,
}

impl FileStore {
    /// Wrap an in-memory topology.
    pub fn new(topology: Topology) -> Self {
        Self { topology }
    }

    /// Load a topology file; the format follows the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::Unavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let topology: Topology = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        tracing::debug!(
            path = %path.display(),
            hosts = topology.hosts.len(),
            modules = topology.modules.len(),
            sensors = topology.sensors.len(),
            "Loaded topology file"
        );
        Ok(Self { topology })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn hosts(&self) -> Result<Vec<HostRecord>, StoreError> {
        Ok(self.topology.hosts.clone())
    }

    async fn tracked_modules(&self, host_id: DbId) -> Result<Vec<ModuleRecord>, StoreError> {
        Ok(self
            .topology
            .modules
            .iter()
            .filter(|m| m.host == host_id && m.track_data)
            .map(|m| ModuleRecord {
                id: m.id,
                module_name: m.module_name.clone(),
                display_name: m.display_name.clone(),
                track_data: m.track_data,
            })
            .collect())
    }

    async fn tracked_sensors(&self, module_id: DbId) -> Result<Vec<SensorRecord>, StoreError> {
        Ok(self
            .topology
            .sensors
            .iter()
            .filter(|s| s.module == module_id && s.track_data)
            .map(|s| SensorRecord {
                id: s.id,
                sensor_name: s.sensor_name.clone(),
            })
            .collect())
    }

    async fn sensor_settings(&self, sensor_id: DbId) -> Result<Vec<SensorSettings>, StoreError> {
        Ok(self
            .topology
            .sensors
            .iter()
            .filter(|s| s.id == sensor_id && s.track_data)
            .map(|s| SensorSettings {
                poll_interval_secs: s.poll_interval,
                alert_threshold: s.alert_threshold,
            })
            .collect())
    }
}
