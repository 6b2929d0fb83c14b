//! Reading ingestion types: Reading, Status, Trend, SensorState

use serde::{Deserialize, Serialize};

// ============================================================================
// Reading
// ============================================================================

/// A single timestamped temperature sample from the time-series store.
///
/// Immutable once ingested. The timestamp (epoch seconds) is the source of
/// truth for ordering; `id` is the opaque key the store assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    /// Epoch seconds
    pub timestamp: u64,
    /// Degrees Celsius
    pub temperature: f64,
}

impl Reading {
    pub fn new(id: impl Into<String>, timestamp: u64, temperature: f64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            temperature,
        }
    }

    /// Timestamp as a UTC datetime (falls back to the epoch for out-of-range values).
    pub fn datetime(&self) -> chrono::DateTime<chrono::Utc> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .unwrap_or_default()
    }
}

// ============================================================================
// Status Band
// ============================================================================

/// Discrete status band for a container temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Safe,
    Warning,
    Critical,
}

impl Status {
    /// Short description shown under the status badge.
    pub fn description(&self) -> &'static str {
        match self {
            Status::Safe => "Container stable",
            Status::Warning => "Rising trend detected",
            Status::Critical => "Action needed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Safe => write!(f, "SAFE"),
            Status::Warning => write!(f, "WARNING"),
            Status::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ============================================================================
// Trend
// ============================================================================

/// Direction of the latest temperature change relative to the previous reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Steady,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Steady => write!(f, "steady"),
        }
    }
}

// ============================================================================
// Sensor State
// ============================================================================

/// Live classification state for one monitored container.
///
/// Mutated only by the monitor after each new reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub current_temperature: f64,
    pub status: Status,
    pub trend: Trend,
    pub last_seen_timestamp: u64,
}
