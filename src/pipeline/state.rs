//! Application State and System Status
//!
//! Shared state for the monitoring pipeline, written by the processing loop
//! and read by the dashboard API handlers.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

use crate::config::defaults::{CHART_CAPACITY, DISPATCH_WARNING_CAPACITY};
use crate::types::{AlertEvent, Channel, Reading, RiskAssessment, SensorState, Status};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state accessible from API handlers and the poller.
///
/// Wrapped in `Arc<RwLock<>>`; only the processing loop writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub container_id: String,

    /// System uptime (serializes as seconds via `uptime_secs`)
    #[serde(skip, default = "Instant::now")]
    pub uptime: Instant,

    pub status: SystemStatus,

    pub connectivity: Connectivity,

    /// Latest classification, `None` until the first reading arrives
    pub sensor: Option<SensorState>,

    pub risk: Option<RiskAssessment>,

    pub baseline: Option<f64>,

    /// Alert log snapshot, newest first
    pub alerts: Vec<AlertEvent>,

    /// Readings retained for the chart and CSV export, oldest first
    #[serde(skip)]
    pub chart: VecDeque<ChartPoint>,

    #[serde(skip)]
    pub chart_capacity: usize,

    /// Recent channel failures, newest first
    pub dispatch_warnings: VecDeque<DispatchWarning>,

    pub readings_processed: u64,
    pub alerts_fired: u64,
    pub alerts_suppressed: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new("CONTAINER-001", CHART_CAPACITY)
    }
}

impl AppState {
    pub fn new(container_id: impl Into<String>, chart_capacity: usize) -> Self {
        let chart_capacity = chart_capacity.max(1);
        Self {
            container_id: container_id.into(),
            uptime: Instant::now(),
            status: SystemStatus::Initializing,
            connectivity: Connectivity::default(),
            sensor: None,
            risk: None,
            baseline: None,
            alerts: Vec::new(),
            chart: VecDeque::with_capacity(chart_capacity),
            chart_capacity,
            dispatch_warnings: VecDeque::with_capacity(DISPATCH_WARNING_CAPACITY),
            readings_processed: 0,
            alerts_fired: 0,
            alerts_suppressed: 0,
        }
    }

    /// Build `AppState` from the global config.
    pub fn from_config() -> Self {
        let cfg = crate::config::get();
        Self::new(cfg.container.id.clone(), cfg.source.chart_capacity)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }

    /// Append a reading to the chart buffer, dropping the oldest at capacity.
    pub fn push_chart(&mut self, point: ChartPoint) {
        if self.chart.len() >= self.chart_capacity {
            self.chart.pop_front();
        }
        self.chart.push_back(point);
    }

    /// Chart points inside `range`, relative to `now` (epoch seconds).
    pub fn chart_points(&self, range: TimeRange, now: u64) -> Vec<ChartPoint> {
        let cutoff = range.window_secs().map(|w| now.saturating_sub(w));
        self.chart
            .iter()
            .filter(|p| cutoff.map_or(true, |c| p.timestamp >= c))
            .cloned()
            .collect()
    }

    /// CSV export of the chart points inside `range`.
    pub fn export_csv(&self, range: TimeRange, now: u64) -> String {
        let mut out = String::from("id,timestamp,iso_time,temperature,status\n");
        for p in self.chart_points(range, now) {
            let iso = Reading::new(String::new(), p.timestamp, p.temperature)
                .datetime()
                .to_rfc3339();
            out.push_str(&format!(
                "{},{},{},{:.2},{}\n",
                csv_field(&p.id),
                p.timestamp,
                iso,
                p.temperature,
                p.status
            ));
        }
        out
    }

    pub fn record_poll_success(&mut self, at: chrono::DateTime<chrono::Utc>) {
        self.connectivity.connected = true;
        self.connectivity.last_error = None;
        self.connectivity.polls_ok += 1;
        self.connectivity.last_success = Some(at);
        if self.status == SystemStatus::Disconnected {
            self.status = self.status_from_sensor();
        }
    }

    /// Flip the connectivity flag; sensor state and chart are retained.
    pub fn record_poll_failure(&mut self, error: impl Into<String>) {
        self.connectivity.connected = false;
        self.connectivity.last_error = Some(error.into());
        self.connectivity.polls_failed += 1;
        self.status = SystemStatus::Disconnected;
    }

    pub fn record_dispatch_failure(&mut self, warning: DispatchWarning) {
        self.dispatch_warnings.push_front(warning);
        self.dispatch_warnings.truncate(DISPATCH_WARNING_CAPACITY);
    }

    /// Recompute the headline status after a sensor update.
    pub fn refresh_status(&mut self) {
        self.status = self.status_from_sensor();
    }

    fn status_from_sensor(&self) -> SystemStatus {
        match self.sensor.as_ref().map(|s| s.status) {
            None => SystemStatus::Initializing,
            Some(Status::Safe) => SystemStatus::Monitoring,
            Some(Status::Warning | Status::Critical) => SystemStatus::Alert,
        }
    }
}

/// Quote a CSV field when it contains a separator or quote.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ============================================================================
// Supporting Types
// ============================================================================

/// Reading-source connectivity, shown as the dashboard's connection badge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Connectivity {
    pub connected: bool,
    pub last_error: Option<String>,
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub last_success: Option<chrono::DateTime<chrono::Utc>>,
}

/// One chart/table row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub id: String,
    pub timestamp: u64,
    pub temperature: f64,
    pub status: Status,
}

impl ChartPoint {
    pub fn new(reading: &Reading, status: Status) -> Self {
        Self {
            id: reading.id.clone(),
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            status,
        }
    }
}

/// A channel that failed to deliver an alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchWarning {
    pub alert_id: String,
    pub channel: Channel,
    pub error: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Chart time-range filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn window_secs(&self) -> Option<u64> {
        match self {
            TimeRange::OneHour => Some(3600),
            TimeRange::SixHours => Some(6 * 3600),
            TimeRange::Day => Some(24 * 3600),
            TimeRange::All => None,
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1h" => Ok(TimeRange::OneHour),
            "6h" => Ok(TimeRange::SixHours),
            "24h" => Ok(TimeRange::Day),
            "all" | "" => Ok(TimeRange::All),
            other => Err(format!("unknown time range '{other}' (expected 1h, 6h, 24h or all)")),
        }
    }
}

/// System operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    /// No reading received yet
    Initializing,
    /// Latest reading is in the safe band
    Monitoring,
    /// Latest reading is outside the safe band
    Alert,
    /// Last poll of the reading source failed
    Disconnected,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Initializing => write!(f, "Initializing"),
            SystemStatus::Monitoring => write!(f, "Monitoring"),
            SystemStatus::Alert => write!(f, "Alert"),
            SystemStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}
