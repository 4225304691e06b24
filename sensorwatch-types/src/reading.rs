//! Reading - a single observed sensor value at a point in time.

use alloc::string::String;
use core::fmt;

use crate::{ReadingValue, SensorRow};

/// One observation of one sensor.
///
/// Readings are built fresh from every snapshot a reading source returns and
/// are never mutated afterwards. The value's variant is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Unix timestamp in milliseconds when the value was captured.
    pub timestamp_ms: u64,

    /// Sensor key as reported by the source (e.g. "Temperature").
    pub key: String,

    /// Parsed value.
    pub value: ReadingValue,

    /// Alert state reported by the hardware. `None` means normal.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub condition: Option<String>,

    /// Unit stripped from the raw value (e.g. "F", "%").
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,

    /// Namespace prepended to the key for display, e.g. `"ServerRoom-"`.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub display_prefix: Option<String>,
}

impl Reading {
    /// Create a reading with no condition, unit or prefix.
    pub fn new(timestamp_ms: u64, key: impl Into<String>, value: ReadingValue) -> Self {
        Self {
            timestamp_ms,
            key: key.into(),
            value,
            condition: None,
            unit: None,
            display_prefix: None,
        }
    }

    /// Build a reading from one row of a module snapshot.
    ///
    /// Fails if the row has a blank key or no value; callers drop such rows
    /// rather than aborting the whole snapshot.
    pub fn from_row(
        row: &SensorRow,
        timestamp_ms: u64,
        display_prefix: Option<&str>,
    ) -> Result<Self, RowError> {
        let key = row.key.trim();
        if key.is_empty() {
            return Err(RowError::MissingKey);
        }
        let raw = row.value.as_deref().ok_or_else(|| RowError::MissingValue {
            key: String::from(key),
        })?;

        Ok(Self {
            timestamp_ms,
            key: String::from(key),
            value: ReadingValue::parse(raw),
            condition: row.condition.clone().filter(|c| !c.is_empty()),
            unit: row.unit.clone(),
            display_prefix: display_prefix.map(String::from),
        })
    }

    /// Build an engine-generated reading (e.g. poll statistics).
    pub fn synthetic(
        timestamp_ms: u64,
        key: impl Into<String>,
        value: impl Into<ReadingValue>,
        display_prefix: Option<&str>,
    ) -> Self {
        Self {
            display_prefix: display_prefix.map(String::from),
            ..Self::new(timestamp_ms, key, value.into())
        }
    }

    /// Attach a display prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.display_prefix = Some(prefix.into());
        self
    }

    /// Attach a condition.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Key prefixed with the display namespace, if any.
    pub fn display_name(&self) -> String {
        match &self.display_prefix {
            Some(prefix) => {
                let mut name = String::with_capacity(prefix.len() + self.key.len());
                name.push_str(prefix);
                name.push_str(&self.key);
                name
            }
            None => self.key.clone(),
        }
    }

    /// Returns true if the hardware flagged this reading.
    pub fn is_alerting(&self) -> bool {
        self.condition.is_some()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.display_name(), self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " ({})", condition)?;
        }
        Ok(())
    }
}

/// Why a snapshot row could not be turned into a [`Reading`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The row carried no sensor name.
    MissingKey,
    /// The row named a sensor but had no value cell.
    MissingValue { key: String },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::MissingKey => f.write_str("sensor row has no key"),
            RowError::MissingValue { key } => write!(f, "sensor row '{}' has no value", key),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RowError {}
