//! # sensorwatch-adapters
//!
//! Reading sources for collecting sensor snapshots from environmental
//! monitoring hardware.
//!
//! A reading source knows how to talk to one kind of appliance: given a host
//! and a module identifier it returns a [`ModuleSnapshot`] of every sensor row
//! the module currently reports. Unit stripping, binary-state remapping and
//! key normalization all happen inside the source, so the polling engine only
//! ever sees clean key/value rows.
//!
//! ## Supported Hardware
//!
//! - **APC Netbotz 500** (`netbotz` feature) - Scrapes the appliance's status pages
//!
//! ## Quick Start (Netbotz)
//!
//! ```rust,no_run
//! use sensorwatch_adapters::netbotz::NetbotzAdapter;
//! use sensorwatch_adapters::ReadingSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = NetbotzAdapter::builder().build()?;
//!
//!     for module in adapter.discover_modules("10.0.0.5").await? {
//!         let snapshot = adapter.fetch("10.0.0.5", &module).await?;
//!         println!("{}: {} sensors", module, snapshot.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

pub mod error;

#[cfg(feature = "netbotz")]
pub mod netbotz;

pub use error::AdapterError;

// Re-export types for convenience
pub use sensorwatch_types::{ModuleSnapshot, SensorRow};

/// A source of module snapshots.
///
/// Implementations must be safe to call concurrently for different modules;
/// the engine polls modules in parallel and shares one source between them.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch every sensor row currently reported by `module` on `host`.
    async fn fetch(&self, host: &str, module: &str) -> Result<ModuleSnapshot, AdapterError>;
}
