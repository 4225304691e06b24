//! Scripted reading source shared by the engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sensorwatch_adapters::{AdapterError, ReadingSource};
use sensorwatch_types::ModuleSnapshot;

/// What the source does when a module is fetched.
#[derive(Debug, Clone)]
pub enum Script {
    Snapshot(ModuleSnapshot),
    /// Sleep, then return the snapshot.
    Delayed(Duration, ModuleSnapshot),
    Fail,
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, Script>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, module: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(module.to_string(), script);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch(&self, host: &str, module: &str) -> Result<ModuleSnapshot, AdapterError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().get(module).cloned();

        match script {
            Some(Script::Snapshot(snapshot)) => Ok(snapshot),
            Some(Script::Delayed(delay, snapshot)) => {
                tokio::time::sleep(delay).await;
                Ok(snapshot)
            }
            Some(Script::Fail) => Err(AdapterError::Connection("connection refused".to_string())),
            None => Err(AdapterError::UnknownModule {
                host: host.to_string(),
                module: module.to_string(),
            }),
        }
    }
}

/// Snapshot with `(key, value)` rows at a fixed timestamp.
pub fn snapshot(rows: &[(&str, &str)]) -> ModuleSnapshot {
    rows.iter()
        .fold(ModuleSnapshot::builder().timestamp_ms(1_000), |b, (key, value)| {
            let value = value.to_string();
            b.row(*key, |r| r.value(value))
        })
        .build()
}
