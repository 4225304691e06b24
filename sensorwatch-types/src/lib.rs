//! # sensorwatch-types
//!
//! Core value types for environmental sensor polling. This crate defines the
//! data exchanged between a reading source (the thing that talks to the
//! hardware) and the polling engine that decides what is worth reporting.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to emit readings as JSON
//! - **Typed values**: A raw value is classified once as integer, float or text
//!   and never re-parsed afterwards
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/MessagePack/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use sensorwatch_types::{ModuleSnapshot, Reading, ReadingValue};
//!
//! let snapshot = ModuleSnapshot::builder()
//!     .timestamp_ms(1703160000000)
//!     .row("Temperature", |r| r.value("72.5").unit("F"))
//!     .row("Door_Switch", |r| r.value("0"))
//!     .build();
//!
//! let readings: Vec<Reading> = snapshot
//!     .rows
//!     .iter()
//!     .filter_map(|row| Reading::from_row(row, snapshot.timestamp_ms, Some("ServerRoom-")).ok())
//!     .collect();
//!
//! assert_eq!(readings[0].value, ReadingValue::Float(72.5));
//! assert_eq!(readings[1].display_name(), "ServerRoom-Door_Switch");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod reading;
mod snapshot;
mod value;

pub use reading::*;
pub use snapshot::*;
pub use value::*;
