//! Typed sensor values.

use alloc::string::{String, ToString};
use core::fmt;

/// Prefix a hardware unit reports for a disconnected or unreadable sensor.
pub const NOT_AVAILABLE: &str = "N/A";

/// The parsed value of a single sensor reading.
///
/// The variant is decided once, when the raw text is parsed, and is never
/// re-coerced afterwards. Threshold and change detection dispatch on it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ReadingValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ReadingValue {
    /// Classify raw text: integer first, then float, otherwise text.
    ///
    /// Surrounding whitespace is ignored for the numeric attempts; text
    /// values are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return ReadingValue::Integer(i);
        }
        // `f64::from_str` accepts "inf"/"nan" spellings, which no sensor emits
        // as a measurement; keep those as text.
        if trimmed.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return ReadingValue::Float(f);
            }
        }
        ReadingValue::Text(raw.to_string())
    }

    /// Numeric view of the value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Integer(i) => Some(*i as f64),
            ReadingValue::Float(f) => Some(*f),
            ReadingValue::Text(_) => None,
        }
    }

    /// Returns true if this is the not-available sentinel (text starting with `N/A`).
    pub fn is_not_available(&self) -> bool {
        match self {
            ReadingValue::Text(s) => s.starts_with(NOT_AVAILABLE),
            _ => false,
        }
    }
}

/// Numeric variants compare by value (`Integer(1) == Float(1.0)`); text only
/// ever equals text.
impl PartialEq for ReadingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ReadingValue::Integer(a), ReadingValue::Integer(b)) => a == b,
            (ReadingValue::Text(a), ReadingValue::Text(b)) => a == b,
            (ReadingValue::Text(_), _) | (_, ReadingValue::Text(_)) => false,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl From<i64> for ReadingValue {
    fn from(v: i64) -> Self {
        ReadingValue::Integer(v)
    }
}

impl From<f64> for ReadingValue {
    fn from(v: f64) -> Self {
        ReadingValue::Float(v)
    }
}

impl From<&str> for ReadingValue {
    fn from(v: &str) -> Self {
        ReadingValue::Text(v.to_string())
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingValue::Integer(i) => write!(f, "{}", i),
            ReadingValue::Float(v) => write!(f, "{}", v),
            ReadingValue::Text(s) => f.write_str(s),
        }
    }
}
