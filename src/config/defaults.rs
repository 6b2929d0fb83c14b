//! System-wide default constants.
//!
//! Centralises magic numbers used as configuration defaults.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Classification Bands
// ============================================================================

/// Lower edge of the safe band (°C, inclusive).
pub const SAFE_MIN_C: f64 = 2.0;

/// Upper edge of the safe band (°C, inclusive).
pub const SAFE_MAX_C: f64 = 8.0;

/// Lower edge of the low-side warning band (°C, inclusive).
pub const WARNING_LOW_C: f64 = 0.0;

/// Upper edge of the high-side warning band (°C, inclusive).
pub const WARNING_HIGH_C: f64 = 10.0;

/// Changes smaller than this are reported as a steady trend (°C).
pub const TREND_DEADBAND_C: f64 = 0.3;

// ============================================================================
// Escalation
// ============================================================================

/// Consecutive-reading jump that counts as a spike (°C).
pub const SPIKE_DELTA_C: f64 = 5.0;

/// Distance from the baseline that counts as a deviation (°C, exclusive).
pub const DEVIATION_LIMIT_C: f64 = 5.0;

/// Extreme temperature (°C).
pub const EXTREME_TEMP_C: f64 = 15.0;

/// Above-safe-limit temperature (°C).
pub const ABOVE_SAFE_TEMP_C: f64 = 10.0;

/// Rising-above-optimal temperature (°C).
pub const ABOVE_OPTIMAL_TEMP_C: f64 = 8.5;

/// Near-upper-limit watch temperature (°C).
pub const NEAR_UPPER_TEMP_C: f64 = 7.5;

/// Cooldown for a fired alert bucket (seconds).
pub const ALERT_COOLDOWN_SECS: u64 = 300;

/// Cooldown for the low-priority spoilage watch (seconds).
pub const WATCH_COOLDOWN_SECS: u64 = 1_800;

/// Number of alerts retained for display.
pub const ALERT_LOG_CAPACITY: usize = 10;

// ============================================================================
// Risk Estimation
// ============================================================================

/// Rolling temperature window kept for spoilage estimation (samples).
pub const HISTORY_WINDOW: usize = 12;

/// Samples averaged by the spoilage estimator.
pub const SPOILAGE_WINDOW: usize = 6;

/// Temperature at which a medium-risk container is projected to breach (°C).
pub const BREACH_LIMIT_C: f64 = 12.0;

/// Projected minutes per degree of headroom below the breach limit.
pub const BREACH_MINUTES_PER_DEGREE: f64 = 12.0;

// ============================================================================
// Ingestion
// ============================================================================

/// Polling interval for the reading source (seconds).
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Readings requested per poll.
pub const FETCH_LIMIT: usize = 100;

/// HTTP timeout for outbound fetch/send calls (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Chart buffer capacity (readings).
pub const CHART_CAPACITY: usize = 100;

// ============================================================================
// Notifications
// ============================================================================

/// Maximum time a single channel send may take before it counts as failed (seconds).
pub const DISPATCH_TIMEOUT_SECS: u64 = 10;

/// In-app toast feed capacity.
pub const TOAST_CAPACITY: usize = 50;

/// Dispatch-failure warnings retained for the dashboard.
pub const DISPATCH_WARNING_CAPACITY: usize = 20;

/// Default port for the notification relay.
pub const RELAY_PORT: u16 = 5000;
