//! # sensorwatch
//!
//! Polling scheduler and threshold engine for networked environmental
//! sensors (temperature, humidity, door and motion state, ...).
//!
//! The engine decides, per sensor and per module, *when* to re-fetch data,
//! *whether* a freshly observed value is worth reporting, and tracks how well
//! the fetches themselves are going.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           CheckerPool                            │
//! │   ┌──────────────┐   ┌──────────────┐          ┌──────────────┐  │
//! │   │ ModulePoller │   │ ModulePoller │   ...    │ ModulePoller │  │
//! │   │  ┌────────┐  │   │  ┌────────┐  │          │              │  │
//! │   │  │Schedule│  │   │  │Schedule│  │          │              │  │
//! │   │  └────────┘  │   │  └────────┘  │          │              │  │
//! │   └──────┬───────┘   └──────┬───────┘          └──────┬───────┘  │
//! └──────────┼──────────────────┼─────────────────────────┼──────────┘
//!            ▼                  ▼                         ▼
//!      ReadingSource (e.g. NetbotzAdapter)          ConfigStore (startup only)
//! ```
//!
//! - **[`schedule`]**: [`SensorSchedule`], the per-sensor due/threshold/change state machine
//! - **[`poller`]**: [`ModulePoller`], one fetch per sweep demultiplexed to its sensors,
//!   plus periodic self-report readings
//! - **[`pool`]**: [`CheckerPool`], built from a [`ConfigStore`] and swept concurrently
//! - **[`store`]**: the [`ConfigStore`] trait with file and MySQL backends
//! - **[`config`]**: [`EngineConfig`] defaults and loading
//! - **[`output`]**: sinks for the readings a sweep returns
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorwatch::{CheckerPool, EngineConfig, FileStore, Output};
//! use sensorwatch_adapters::netbotz::NetbotzAdapter;
//! use sensorwatch_types::current_timestamp_ms;
//!
//! # tokio_test::block_on(async {
//! let store = FileStore::load("topology.toml")?;
//! let source = Arc::new(NetbotzAdapter::builder().build()?);
//! let engine = EngineConfig::default();
//!
//! let mut pool = CheckerPool::initialize(&store, source, &engine, current_timestamp_ms()).await?;
//! let output = Output::stdout(false);
//!
//! let readings = pool.check(current_timestamp_ms()).await;
//! output.emit(&readings).await?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod output;
pub mod poller;
pub mod pool;
pub mod schedule;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use self::config::EngineConfig;
pub use error::PoolError;
pub use output::Output;
pub use poller::{ModuleConfig, ModulePoller, PollStats};
pub use pool::CheckerPool;
pub use schedule::{SensorConfig, SensorSchedule};
pub use sensorwatch_types::{Reading, ReadingValue};
#[cfg(feature = "mysql")]
pub use store::MySqlStore;
pub use store::{ConfigStore, FileStore, StoreError};
