//! APC Netbotz adapter using the appliance's web UI.
//!
//! Netbotz 500 appliances expose no machine-readable API, so this adapter
//! scrapes two pages:
//!
//! - `/pages/menu_noscript.html` lists the sensor modules (sensor pods,
//!   camera pods) attached to the appliance
//! - `/pages/status.html?encid=<module>` renders a `sensortable` with one row
//!   per sensor: name, value (as a link to its graph) and alert condition
//!
//! ## Normalization
//!
//! - Units are stripped from `Temperature`, `Humidity`, `Dew Point`,
//!   `Air Flow` and `Audio` values and reported separately
//! - Disconnected pods report `N/A`, which is passed through untouched
//! - Spaces in keys and values become `_`, parentheses are dropped from keys
//! - `Closed`/`No_Motion` become `0`, `Open`/`Motion_Detected` become `1`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sensorwatch_adapters::netbotz::NetbotzAdapter;
//! use sensorwatch_adapters::ReadingSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = NetbotzAdapter::builder()
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let snapshot = adapter.fetch("10.0.0.5", "nbSensorPod_1A2B").await?;
//!     for row in &snapshot.rows {
//!         println!("{} = {:?}", row.key, row.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use sensorwatch_types::{current_timestamp_ms, ModuleSnapshot, SensorRow};

use crate::{AdapterError, ReadingSource};

const STATUS_PATH: &str = "/pages/status.html?encid=";
const MENU_PATH: &str = "/pages/menu_noscript.html";

/// Aggregate "alerting sensors" view listed alongside the real modules.
const ALERTING_SET: &str = "nbSensorSet_Alerting";

/// Keys whose values carry a unit suffix after a leading number.
const NUMERIC_KEYS: &[&str] = &["Temperature", "Humidity", "Dew Point", "Air Flow", "Audio"];

static SENSOR_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<table\b[^>]*\bclass\s*=\s*["']?[^"'>]*\bsensortable\b[^>]*>(.*?)</table>"#)
        .expect("valid regex")
});
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<tr\b[^>]*>").expect("valid regex"));
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<t[dh]\b[^>]*>").expect("valid regex"));
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.?\d*").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>").expect("valid regex"));
static TARGET_SENSOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btarget\s*=\s*["']?sensor(?:["'\s]|$)"#).expect("valid regex")
});
static MODULE_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*["']?(?:[^"'\s>]*/)?status\.html\?encid=([^"'\s&>]+)"#)
        .expect("valid regex")
});

/// Netbotz adapter for fetching sensor module snapshots.
#[derive(Debug, Clone)]
pub struct NetbotzAdapter {
    client: Client,
}

impl NetbotzAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> NetbotzAdapterBuilder {
        NetbotzAdapterBuilder::default()
    }

    /// List the sensor modules attached to a host.
    ///
    /// The aggregate alerting view is excluded; only real modules are returned.
    pub async fn discover_modules(&self, host: &str) -> Result<Vec<String>, AdapterError> {
        let url = format!("{}{}", host_url(host), MENU_PATH);
        let html = self.get_page(&url).await?;
        let modules = parse_menu_page(&html);

        tracing::debug!(host, count = modules.len(), "Discovered sensor modules");
        Ok(modules)
    }

    async fn get_page(&self, url: &str) -> Result<String, AdapterError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ReadingSource for NetbotzAdapter {
    async fn fetch(&self, host: &str, module: &str) -> Result<ModuleSnapshot, AdapterError> {
        let url = format!("{}{}{}", host_url(host), STATUS_PATH, urlencoded(module));
        let html = self.get_page(&url).await?;

        let snapshot = parse_status_page(&html, current_timestamp_ms())?;
        tracing::debug!(host, module, rows = snapshot.len(), "Fetched status page");
        Ok(snapshot)
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for NetbotzAdapter.
#[derive(Debug, Default)]
pub struct NetbotzAdapterBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl NetbotzAdapterBuilder {
    /// Set the overall request timeout (default: 20 seconds).
    ///
    /// Appliances with a flaky link can stall mid-body; this bounds the read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the TCP connect timeout (default: 5 seconds).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Request and connect timeouts with defaults applied.
    fn timeouts(&self) -> (Duration, Duration) {
        (
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        )
    }

    /// Build the adapter.
    pub fn build(self) -> Result<NetbotzAdapter, AdapterError> {
        let (timeout, connect_timeout) = self.timeouts();
        tracing::debug!(?timeout, ?connect_timeout, "Building netbotz client");

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(NetbotzAdapter { client })
    }
}

/// Parse a module status page into a snapshot.
///
/// The first row of the sensor table is its header. Rows whose value link
/// is missing are kept with `value: None`.
pub fn parse_status_page(html: &str, timestamp_ms: u64) -> Result<ModuleSnapshot, AdapterError> {
    let table = SENSOR_TABLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| AdapterError::Parse("status page has no sensortable".to_string()))?;

    let rows = segments(table.as_str(), &ROW_RE)
        .into_iter()
        .skip(1)
        .filter_map(parse_row)
        .collect();

    Ok(ModuleSnapshot { timestamp_ms, rows })
}

/// Extract module identifiers from the navigation menu page.
pub fn parse_menu_page(html: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(html)
        .filter_map(|link| {
            let attrs = link.get(1)?.as_str();
            if !TARGET_SENSOR_RE.is_match(attrs) {
                return None;
            }
            let module = MODULE_HREF_RE.captures(attrs)?.get(1)?.as_str();
            (module != ALERTING_SET).then(|| module.to_string())
        })
        .collect()
}

fn parse_row(row: &str) -> Option<SensorRow> {
    let cells = segments(row, &CELL_RE);
    let first = cells.first()?;

    let label = text(first);
    let label = label.strip_suffix(':').unwrap_or(&label).trim();

    let raw_value = cells
        .get(1)
        .and_then(|cell| ANCHOR_RE.captures(cell))
        .and_then(|c| c.get(1))
        .map(|m| text(m.as_str()));

    let condition = cells
        .get(2)
        .map(|cell| text(cell))
        .filter(|c| !c.is_empty() && c != "---");

    let (value, unit) = match raw_value {
        Some(raw) => {
            let (value, unit) = strip_unit(label, &raw);
            (Some(remap_binary(value.replace(' ', "_"))), unit)
        }
        None => (None, None),
    };

    Some(SensorRow {
        key: normalize_key(label),
        value,
        condition,
        unit,
    })
}

/// Keep the leading number of a unit-bearing value.
///
/// Values without one (a disconnected pod's `N/A`) come back unchanged and
/// without a unit.
fn strip_unit(label: &str, raw: &str) -> (String, Option<String>) {
    if !NUMERIC_KEYS.contains(&label) {
        return (raw.to_string(), None);
    }
    match LEADING_NUMBER_RE.find(raw) {
        Some(m) => (m.as_str().to_string(), unit_for(label).map(String::from)),
        None => (raw.to_string(), None),
    }
}

fn unit_for(label: &str) -> Option<&'static str> {
    match label {
        "Temperature" | "Dew Point" => Some("F"),
        "Humidity" => Some("%"),
        "Air Flow" => Some("ft/min"),
        _ => None,
    }
}

fn remap_binary(value: String) -> String {
    match value.as_str() {
        "Closed" | "No_Motion" => "0".to_string(),
        "Open" | "Motion_Detected" => "1".to_string(),
        _ => value,
    }
}

fn normalize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Split `html` into the fragments following each match of `opener`.
fn segments<'a>(html: &'a str, opener: &Regex) -> Vec<&'a str> {
    let starts: Vec<_> = opener.find_iter(html).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let end = starts.get(i + 1).map_or(html.len(), |next| next.start());
            &html[m.end()..end]
        })
        .collect()
}

/// Visible text of an HTML fragment with whitespace collapsed.
fn text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&deg;", "°")
        .replace("&#176;", "°")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Prepend `http://` to bare addresses and drop trailing slashes.
fn host_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

// URL encode a module id for use in a query string
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('&', "%26")
        .replace('#', "%23")
}
