//! The full polling topology and one sweep across it.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use sensorwatch_adapters::ReadingSource;
use sensorwatch_types::Reading;

use crate::config::EngineConfig;
use crate::error::PoolError;
use crate::poller::{ModuleConfig, ModulePoller};
use crate::schedule::{SensorConfig, SensorSchedule};
use crate::store::ConfigStore;

/// Every tracked module, in host-then-module order.
#[derive(Debug)]
pub struct CheckerPool {
    pollers: Vec<ModulePoller>,
    max_concurrent_polls: usize,
}

impl CheckerPool {
    /// Build a pool from already constructed pollers.
    pub fn new(pollers: Vec<ModulePoller>, max_concurrent_polls: usize) -> Self {
        Self {
            pollers,
            max_concurrent_polls: max_concurrent_polls.max(1),
        }
    }

    /// Read the topology from `store` and build a poller per tracked module.
    ///
    /// Hosts without tracked modules and modules without tracked sensors are
    /// accepted. A sensor that does not resolve to exactly one settings row
    /// aborts initialization.
    pub async fn initialize<S>(
        store: &S,
        source: Arc<dyn ReadingSource>,
        engine: &EngineConfig,
        now_ms: u64,
    ) -> Result<Self, PoolError>
    where
        S: ConfigStore + ?Sized,
    {
        engine.validate()?;

        let mut pollers = Vec::new();
        for host in store.hosts().await? {
            for module in store.tracked_modules(host.id).await? {
                let mut sensors = Vec::new();
                for sensor in store.tracked_sensors(module.id).await? {
                    let mut rows = store.sensor_settings(sensor.id).await?;
                    let settings = match rows.len() {
                        1 => rows.remove(0),
                        n => {
                            return Err(PoolError::SensorConfig {
                                sensor_id: sensor.id,
                                rows: n,
                            })
                        }
                    };
                    let config = SensorConfig::from_settings(sensor.sensor_name, &settings, engine);
                    sensors.push(SensorSchedule::new(config, now_ms));
                }

                tracing::debug!(
                    host = %host.address,
                    module = %module.module_name,
                    sensors = sensors.len(),
                    "Tracking module"
                );

                let config = ModuleConfig::new(
                    host.address.clone(),
                    module.module_name.clone(),
                    module.label(),
                );
                pollers.push(ModulePoller::new(config, sensors, source.clone(), engine, now_ms));
            }
        }

        let pool = Self::new(pollers, engine.max_concurrent_polls);
        tracing::info!(
            modules = pool.len(),
            sensors = pool.sensor_count(),
            "Checker pool initialized"
        );
        Ok(pool)
    }

    pub fn pollers(&self) -> &[ModulePoller] {
        &self.pollers
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollers.is_empty()
    }

    /// Number of sensors across all modules.
    pub fn sensor_count(&self) -> usize {
        self.pollers.iter().map(|p| p.sensors().len()).sum()
    }

    /// Run one sweep over every module.
    ///
    /// Up to `max_concurrent_polls` modules are fetched at once. Readings stay
    /// grouped per module and the groups come back in pool order. Dropping the
    /// returned future abandons in-flight fetches without touching any state.
    pub async fn check(&mut self, now_ms: u64) -> Vec<Reading> {
        let per_module: Vec<Vec<Reading>> =
            stream::iter(self.pollers.iter_mut().map(|poller| poller.check(now_ms)))
                .buffered(self.max_concurrent_polls)
                .collect()
                .await;

        per_module.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use sensorwatch_types::ReadingValue;
    use tokio::time::Instant;

    use crate::store::{
        DbId, FileStore, HostRecord, ModuleEntry, ModuleRecord, SensorEntry, SensorRecord,
        SensorSettings, StoreError, Topology,
    };
    use crate::testing::{snapshot, Script, ScriptedSource};

    fn module(id: DbId, host: DbId, name: &str) -> ModuleEntry {
        ModuleEntry {
            id,
            host,
            module_name: name.to_string(),
            display_name: Some(format!("Room{}", id)),
            track_data: true,
        }
    }

    fn sensor(id: DbId, module: DbId, name: &str) -> SensorEntry {
        SensorEntry {
            id,
            module,
            sensor_name: name.to_string(),
            poll_interval: Some(0),
            alert_threshold: None,
            track_data: true,
        }
    }

    fn two_module_topology() -> Topology {
        Topology {
            hosts: vec![
                HostRecord {
                    id: 1,
                    address: "10.0.0.5".to_string(),
                },
                HostRecord {
                    id: 2,
                    address: "10.0.0.6".to_string(),
                },
                HostRecord {
                    id: 3,
                    address: "10.0.0.7".to_string(),
                },
            ],
            modules: vec![module(10, 1, "podA"), module(20, 2, "podB"), module(21, 2, "empty")],
            sensors: vec![sensor(100, 10, "Temperature"), sensor(200, 20, "Humidity")],
        }
    }

    async fn pool_with(source: &Arc<ScriptedSource>, engine: &EngineConfig) -> CheckerPool {
        let store = FileStore::new(two_module_topology());
        CheckerPool::initialize(&store, source.clone(), engine, 0)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_builds_topology() {
        let source = Arc::new(ScriptedSource::new());
        let pool = pool_with(&source, &EngineConfig::default()).await;

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.sensor_count(), 2);

        let first = &pool.pollers()[0];
        assert_eq!(first.config().host, "10.0.0.5");
        assert_eq!(first.config().display_name, "Room10");
        assert_eq!(first.sensors()[0].config().poll_interval, Duration::ZERO);
        assert_eq!(first.sensors()[0].config().alert_threshold, 0.5);
        assert!(pool.pollers()[2].sensors().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_settings_rows_abort_initialization() {
        let mut topology = two_module_topology();
        topology.sensors.push(sensor(100, 10, "Temperature"));
        let store = FileStore::new(topology);

        let err = CheckerPool::initialize(
            &store,
            Arc::new(ScriptedSource::new()),
            &EngineConfig::default(),
            0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PoolError::SensorConfig { sensor_id: 100, rows: 2 }));
    }

    /// Store whose sensors have no settings rows, or which cannot be reached.
    struct BrokenStore {
        reachable: bool,
    }

    #[async_trait]
    impl ConfigStore for BrokenStore {
        async fn hosts(&self) -> Result<Vec<HostRecord>, StoreError> {
            if !self.reachable {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            Ok(vec![HostRecord {
                id: 1,
                address: "10.0.0.5".to_string(),
            }])
        }

        async fn tracked_modules(&self, _host_id: DbId) -> Result<Vec<ModuleRecord>, StoreError> {
            Ok(vec![ModuleRecord {
                id: 10,
                module_name: "podA".to_string(),
                display_name: None,
                track_data: true,
            }])
        }

        async fn tracked_sensors(&self, _module_id: DbId) -> Result<Vec<SensorRecord>, StoreError> {
            Ok(vec![SensorRecord {
                id: 7,
                sensor_name: "Temperature".to_string(),
            }])
        }

        async fn sensor_settings(&self, _sensor_id: DbId) -> Result<Vec<SensorSettings>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_missing_settings_row_aborts_initialization() {
        let err = CheckerPool::initialize(
            &BrokenStore { reachable: true },
            Arc::new(ScriptedSource::new()),
            &EngineConfig::default(),
            0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PoolError::SensorConfig { sensor_id: 7, rows: 0 }));
    }

    #[tokio::test]
    async fn test_unreachable_store_aborts_initialization() {
        let err = CheckerPool::initialize(
            &BrokenStore { reachable: false },
            Arc::new(ScriptedSource::new()),
            &EngineConfig::default(),
            0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PoolError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_one_failing_module_contributes_nothing() {
        let source = Arc::new(ScriptedSource::new());
        source.set("podA", Script::Fail);
        source.set("podB", Script::Snapshot(snapshot(&[("Humidity", "41")])));
        source.set("empty", Script::Snapshot(snapshot(&[])));
        let mut pool = pool_with(&source, &EngineConfig::default()).await;

        let alerts = pool.check(1).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].display_name(), "Room20-Humidity");
        assert_eq!(alerts[0].value, ReadingValue::Integer(41));

        assert_eq!(pool.pollers()[0].stats().failure_count(), 1);
        assert!(pool.pollers()[0].sensors()[0].current().is_none());
    }

    #[tokio::test]
    async fn test_alerts_grouped_in_pool_order() {
        let source = Arc::new(ScriptedSource::new());
        source.set("podA", Script::Snapshot(snapshot(&[("Temperature", "70")])));
        source.set("podB", Script::Snapshot(snapshot(&[("Humidity", "41")])));
        source.set("empty", Script::Snapshot(snapshot(&[])));
        let mut pool = pool_with(&source, &EngineConfig::default()).await;

        let names: Vec<_> = pool.check(1).await.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, vec!["Room10-Temperature", "Room20-Humidity"]);
        assert_eq!(source.fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_modules_are_polled_concurrently() {
        let source = Arc::new(ScriptedSource::new());
        for module in ["podA", "podB", "empty"] {
            source.set(module, Script::Delayed(Duration::from_secs(3), snapshot(&[])));
        }

        let mut pool = pool_with(&source, &EngineConfig::default()).await;
        let started = Instant::now();
        pool.check(1).await;
        let concurrent = started.elapsed();

        let serial_engine = EngineConfig {
            max_concurrent_polls: 1,
            ..EngineConfig::default()
        };
        let mut serial = pool_with(&source, &serial_engine).await;
        let started = Instant::now();
        serial.check(1).await;
        let sequential = started.elapsed();

        assert!(concurrent < Duration::from_secs(4), "{concurrent:?}");
        assert!(sequential >= Duration::from_secs(9), "{sequential:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sweep_leaves_schedules_untouched() {
        let source = Arc::new(ScriptedSource::new());
        source.set("podA", Script::Snapshot(snapshot(&[("Temperature", "70")])));
        source.set(
            "podB",
            Script::Delayed(Duration::from_secs(3), snapshot(&[("Humidity", "41")])),
        );
        source.set("empty", Script::Snapshot(snapshot(&[])));
        let mut pool = pool_with(&source, &EngineConfig::default()).await;

        let outcome = tokio::time::timeout(Duration::from_secs(1), pool.check(1)).await;
        assert!(outcome.is_err());

        let slow = &pool.pollers()[1];
        assert!(slow.sensors()[0].current().is_none());
        assert_eq!(slow.sensors()[0].next_check_ms(), 0);
        assert_eq!(slow.stats().success_count() + slow.stats().failure_count(), 0);
    }
}
