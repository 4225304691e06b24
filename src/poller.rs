//! Polling one sensor module.
//!
//! A [`ModulePoller`] fetches its module's snapshot once per sweep, hands each
//! row to the [`SensorSchedule`] tracking that key, and keeps running
//! statistics about the fetches themselves. Those statistics are reported as
//! synthetic readings every `self_report_interval` and then reset.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sensorwatch_adapters::ReadingSource;
use sensorwatch_types::{ModuleSnapshot, Reading};
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::duration::format_duration;
use crate::schedule::SensorSchedule;

/// Self-report key for the share of failed fetches.
pub const POLL_FAILURE_RATE: &str = "poll_failure_rate";

/// Self-report key for the average fetch duration in seconds.
pub const AVG_RETRIEVAL: &str = "avg_html_retrieval";

/// Where a module lives and how its readings are labelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    /// Host address passed to the reading source.
    pub host: String,
    /// Module identifier passed to the reading source.
    pub module: String,
    /// Namespace for this module's readings.
    pub display_name: String,
}

impl ModuleConfig {
    pub fn new(
        host: impl Into<String>,
        module: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            module: module.into(),
            display_name: display_name.into(),
        }
    }
}

/// Fetch statistics since the last self-report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollStats {
    success_count: u64,
    failure_count: u64,
    avg_poll_duration: Option<Duration>,
}

impl PollStats {
    /// Count a successful fetch.
    ///
    /// The average is damped: `avg = (avg + d) / successes`, so samples later
    /// in a reporting window weigh progressively less.
    pub fn record_success(&mut self, duration: Duration) {
        self.success_count += 1;
        self.avg_poll_duration = Some(match self.avg_poll_duration {
            Some(avg) => Duration::from_secs_f64(
                (avg + duration).as_secs_f64() / self.success_count as f64,
            ),
            None => duration,
        });
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn avg_poll_duration(&self) -> Option<Duration> {
        self.avg_poll_duration
    }

    /// Failures over attempts, `None` before the first attempt.
    pub fn failure_rate(&self) -> Option<f64> {
        let attempts = self.success_count + self.failure_count;
        (attempts > 0).then(|| self.failure_count as f64 / attempts as f64)
    }
}

/// One network-addressable module and the sensors tracked on it.
pub struct ModulePoller {
    config: ModuleConfig,
    prefix: String,
    sensors: Vec<SensorSchedule>,
    source: Arc<dyn ReadingSource>,
    fetch_timeout: Duration,
    self_report_interval: Duration,
    stats: PollStats,
    next_self_report_ms: u64,
}

impl std::fmt::Debug for ModulePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModulePoller")
            .field("config", &self.config)
            .field("sensors", &self.sensors.len())
            .field("stats", &self.stats)
            .field("next_self_report_ms", &self.next_self_report_ms)
            .finish()
    }
}

impl ModulePoller {
    /// Create a poller whose first self-report falls one interval after `now_ms`.
    pub fn new(
        config: ModuleConfig,
        sensors: Vec<SensorSchedule>,
        source: Arc<dyn ReadingSource>,
        engine: &EngineConfig,
        now_ms: u64,
    ) -> Self {
        let prefix = format!("{}-", config.display_name);
        Self {
            config,
            prefix,
            sensors,
            source,
            fetch_timeout: engine.fetch_timeout,
            self_report_interval: engine.self_report_interval,
            stats: PollStats::default(),
            next_self_report_ms: now_ms.saturating_add(millis(engine.self_report_interval)),
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn sensors(&self) -> &[SensorSchedule] {
        &self.sensors
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn next_self_report_ms(&self) -> u64 {
        self.next_self_report_ms
    }

    /// Run this module's part of a sweep.
    ///
    /// Returns sensor alerts followed by any self-report readings. Fetch
    /// failures are counted, logged and otherwise swallowed. Nothing is
    /// mutated until the fetch has resolved, so dropping the returned future
    /// early leaves the poller exactly as it was.
    ///
    /// `now_ms` is the sweep start. Sensor due decisions use `now_ms` plus the
    /// time the fetch took, so a slow module is judged at the moment its data
    /// arrived. Self-report timing stays on the sweep clock.
    pub async fn check(&mut self, now_ms: u64) -> Vec<Reading> {
        let started = Instant::now();
        let fetched = tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch(&self.config.host, &self.config.module),
        )
        .await;
        let elapsed = started.elapsed();

        let mut readings = match fetched {
            Ok(Ok(snapshot)) => {
                self.stats.record_success(elapsed);
                tracing::debug!(
                    module = %self.config.module,
                    rows = snapshot.len(),
                    elapsed = %format_duration(elapsed),
                    "Fetched module snapshot"
                );
                self.apply_snapshot(&snapshot, now_ms.saturating_add(millis(elapsed)))
            }
            Ok(Err(err)) => {
                self.stats.record_failure();
                tracing::warn!(
                    host = %self.config.host,
                    module = %self.config.module,
                    transport = err.is_transport(),
                    error = %err,
                    "Module fetch failed"
                );
                Vec::new()
            }
            Err(_) => {
                self.stats.record_failure();
                tracing::warn!(
                    host = %self.config.host,
                    module = %self.config.module,
                    timeout = %format_duration(self.fetch_timeout),
                    "Module fetch timed out"
                );
                Vec::new()
            }
        };

        readings.extend(self.self_report(now_ms));
        readings
    }

    fn apply_snapshot(&mut self, snapshot: &ModuleSnapshot, observed_ms: u64) -> Vec<Reading> {
        let mut latest: HashMap<String, Reading> = HashMap::with_capacity(snapshot.len());
        for row in &snapshot.rows {
            match Reading::from_row(row, snapshot.timestamp_ms, Some(self.prefix.as_str())) {
                Ok(reading) => {
                    latest.insert(reading.key.clone(), reading);
                }
                Err(err) => {
                    tracing::warn!(module = %self.config.module, error = %err, "Skipping sensor row");
                }
            }
        }

        let mut alerts = Vec::new();
        for sensor in &mut self.sensors {
            let Some(reading) = latest.get(sensor.name()) else {
                continue;
            };

            let due = sensor.is_due(observed_ms);
            if !due && !sensor.exceeds_threshold(reading) {
                continue;
            }

            sensor.accept(reading.clone());
            match sensor.pending_alert() {
                Some(alert) => {
                    tracing::debug!(sensor = %alert.display_name(), value = %alert.value, due, "Reading changed");
                    alerts.push(alert.clone());
                }
                None => {
                    tracing::trace!(sensor = %sensor.name(), "Reading unchanged");
                }
            }
        }
        alerts
    }

    fn self_report(&mut self, now_ms: u64) -> Vec<Reading> {
        if now_ms <= self.next_self_report_ms {
            return Vec::new();
        }

        let mut report = Vec::with_capacity(2);
        if let Some(rate) = self.stats.failure_rate() {
            report.push(Reading::synthetic(now_ms, POLL_FAILURE_RATE, rate, Some(self.prefix.as_str())));
        }
        if let Some(avg) = self.stats.avg_poll_duration() {
            report.push(Reading::synthetic(
                now_ms,
                AVG_RETRIEVAL,
                avg.as_secs_f64(),
                Some(self.prefix.as_str()),
            ));
        }

        tracing::info!(
            module = %self.config.module,
            successes = self.stats.success_count(),
            failures = self.stats.failure_count(),
            "Self-report"
        );

        self.stats = PollStats::default();
        self.next_self_report_ms = now_ms.saturating_add(millis(self.self_report_interval));
        report
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
