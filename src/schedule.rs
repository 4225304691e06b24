//! Per-sensor scheduling and significance decisions.

use std::time::Duration;

use sensorwatch_types::Reading;

use crate::config::EngineConfig;
use crate::store::SensorSettings;

/// How one sensor is polled and when it alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// Key the reading source reports for this sensor.
    pub sensor_name: String,

    /// Zero means the sensor is due on every sweep.
    pub poll_interval: Duration,

    /// Fractional change that forces an early accept. Zero disables it.
    pub alert_threshold: f64,
}

impl SensorConfig {
    /// Create a sensor config with explicit values.
    pub fn new(sensor_name: impl Into<String>, poll_interval: Duration, alert_threshold: f64) -> Self {
        Self {
            sensor_name: sensor_name.into(),
            poll_interval,
            alert_threshold,
        }
    }

    /// Apply engine defaults to whatever the store left unset.
    pub fn from_settings(
        sensor_name: impl Into<String>,
        settings: &SensorSettings,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            sensor_name: sensor_name.into(),
            poll_interval: settings
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(engine.default_interval),
            alert_threshold: settings.alert_threshold.unwrap_or(engine.default_threshold),
        }
    }
}

/// State machine for a single configured sensor.
///
/// `next_check_ms` only ever moves forward by exactly one poll interval per
/// accepted reading. When sweeps run slower than the interval it falls behind
/// wall-clock time and the sensor stays due until it catches up.
#[derive(Debug, Clone)]
pub struct SensorSchedule {
    config: SensorConfig,
    next_check_ms: u64,
    current: Option<Reading>,
    previous: Option<Reading>,
}

impl SensorSchedule {
    /// Create a schedule that is already due at `now_ms`.
    ///
    /// The first deadline sits one millisecond before `now_ms` so a sweep
    /// stamped with the construction time still passes the strict
    /// [`is_due`](Self::is_due) comparison.
    pub fn new(config: SensorConfig, now_ms: u64) -> Self {
        Self {
            config,
            next_check_ms: now_ms.saturating_sub(1),
            current: None,
            previous: None,
        }
    }

    /// Sensor key this schedule tracks.
    pub fn name(&self) -> &str {
        &self.config.sensor_name
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn next_check_ms(&self) -> u64 {
        self.next_check_ms
    }

    /// Last accepted reading.
    pub fn current(&self) -> Option<&Reading> {
        self.current.as_ref()
    }

    /// Reading accepted before the current one.
    pub fn previous(&self) -> Option<&Reading> {
        self.previous.as_ref()
    }

    /// Returns true if the poll interval has elapsed.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.config.poll_interval.is_zero() || now_ms > self.next_check_ms
    }

    /// Returns true if `candidate` moved far enough from the current reading
    /// to be accepted ahead of schedule.
    ///
    /// Must be called before [`accept`](Self::accept). A first observation
    /// always qualifies; a not-available value never does; a non-numeric value
    /// on either side never does.
    pub fn exceeds_threshold(&self, candidate: &Reading) -> bool {
        let threshold = self.config.alert_threshold;
        if threshold == 0.0 {
            return false;
        }
        let Some(current) = &self.current else {
            return true;
        };
        if candidate.value.is_not_available() {
            return false;
        }

        match (candidate.value.as_f64(), current.value.as_f64()) {
            (Some(new), Some(cur)) => new > cur * (1.0 + threshold) || new < cur * (1.0 - threshold),
            _ => false,
        }
    }

    /// Install `candidate` as the current reading and advance the schedule.
    pub fn accept(&mut self, candidate: Reading) {
        self.previous = self.current.replace(candidate);
        let interval_ms = u64::try_from(self.config.poll_interval.as_millis()).unwrap_or(u64::MAX);
        self.next_check_ms = self.next_check_ms.saturating_add(interval_ms);
    }

    /// The current reading, if it is new or differs from the previous one.
    pub fn pending_alert(&self) -> Option<&Reading> {
        let current = self.current.as_ref()?;
        match &self.previous {
            None => Some(current),
            Some(previous) if previous.value != current.value => Some(current),
            Some(_) => None,
        }
    }
}
