//! ModuleSnapshot - everything one module reported in a single fetch.

use alloc::string::String;
use alloc::vec::Vec;

/// One sensor row as delivered by a reading source.
///
/// Unit suffixes, binary-state remapping and key normalization have already
/// been applied by the source; the value is still raw text.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorRow {
    /// Sensor key (e.g. "Temperature", "Door_Switch").
    pub key: String,

    /// Raw value text. `None` if the source could not locate a value.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub value: Option<String>,

    /// Alert condition; `None` or empty means normal.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub condition: Option<String>,

    /// Unit stripped from the value, if any.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
}

/// A point-in-time capture of every sensor row on one module.
///
/// # Example
///
/// ```rust
/// use sensorwatch_types::ModuleSnapshot;
///
/// let snapshot = ModuleSnapshot::builder()
///     .row("Temperature", |r| r.value("68").unit("F"))
///     .row("Humidity", |r| r.value("35").unit("%").condition("Low"))
///     .build();
///
/// assert_eq!(snapshot.len(), 2);
/// assert!(snapshot.get("Humidity").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleSnapshot {
    /// Unix timestamp in milliseconds when the snapshot was captured.
    pub timestamp_ms: u64,

    /// Rows in the order the source reported them. Keys may repeat.
    pub rows: Vec<SensorRow>,
}

impl ModuleSnapshot {
    /// Create an empty snapshot with the current timestamp.
    #[cfg(feature = "std")]
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create an empty snapshot with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            rows: Vec::new(),
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> ModuleSnapshotBuilder {
        ModuleSnapshotBuilder::new()
    }

    /// Check if the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Last row with the given key.
    pub fn get(&self, key: &str) -> Option<&SensorRow> {
        self.rows.iter().rev().find(|r| r.key == key)
    }
}

#[cfg(feature = "std")]
impl Default for ModuleSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a single [`SensorRow`].
#[derive(Debug, Default)]
pub struct SensorRowBuilder {
    row: SensorRow,
}

impl SensorRowBuilder {
    /// Set the raw value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.row.value = Some(value.into());
        self
    }

    /// Set the alert condition.
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.row.condition = Some(condition.into());
        self
    }

    /// Set the unit.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.row.unit = Some(unit.into());
        self
    }
}

/// Builder for constructing `ModuleSnapshot` instances.
#[derive(Debug)]
pub struct ModuleSnapshotBuilder {
    timestamp_ms: Option<u64>,
    rows: Vec<SensorRow>,
}

impl ModuleSnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            timestamp_ms: None,
            rows: Vec::new(),
        }
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add a row built using a closure.
    pub fn row<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(SensorRowBuilder) -> SensorRowBuilder,
    {
        let builder = SensorRowBuilder {
            row: SensorRow {
                key: key.into(),
                ..SensorRow::default()
            },
        };
        self.rows.push(f(builder).row);
        self
    }

    /// Build the snapshot.
    #[cfg(feature = "std")]
    pub fn build(self) -> ModuleSnapshot {
        ModuleSnapshot {
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            rows: self.rows,
        }
    }

    /// Build the snapshot with a specific timestamp (for no_std).
    #[cfg(not(feature = "std"))]
    pub fn build(self) -> ModuleSnapshot {
        ModuleSnapshot {
            timestamp_ms: self.timestamp_ms.unwrap_or(0),
            rows: self.rows,
        }
    }
}

impl Default for ModuleSnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time in milliseconds since the Unix epoch.
#[cfg(feature = "std")]
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = ModuleSnapshot::builder()
            .timestamp_ms(1703160000000)
            .row("Temperature", |r| r.value("70").unit("F"))
            .row("Camera_Motion", |r| r.value("1").condition("Motion"))
            .build();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.timestamp_ms, 1703160000000);

        let motion = snapshot.get("Camera_Motion").unwrap();
        assert_eq!(motion.value.as_deref(), Some("1"));
        assert_eq!(motion.condition.as_deref(), Some("Motion"));
        assert!(motion.unit.is_none());
    }

    #[test]
    fn test_get_prefers_last_duplicate() {
        let snapshot = ModuleSnapshot::builder()
            .row("Audio", |r| r.value("10"))
            .row("Audio", |r| r.value("12"))
            .build();

        assert_eq!(snapshot.get("Audio").unwrap().value.as_deref(), Some("12"));
    }

    #[test]
    fn test_row_without_value() {
        let snapshot = ModuleSnapshot::builder().row("Air_Flow", |r| r).build();
        assert!(snapshot.rows[0].value.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let snapshot = ModuleSnapshot::builder()
            .timestamp_ms(1703160000000)
            .row("Humidity", |r| r.value("40").unit("%"))
            .build();

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: ModuleSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
    }
}
