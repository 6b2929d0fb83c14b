//! Monitor Configuration - thresholds, cooldowns and endpoints as TOML values
//!
//! Each struct implements `Default` with the values in `defaults.rs`, so a
//! deployment without a config file behaves exactly like the reference setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitoring deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$COLDCHAIN_CONFIG` env var
/// 2. `./coldchain.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Monitored container identification
    #[serde(default)]
    pub container: ContainerInfo,

    /// Reading source (realtime database endpoint and polling)
    #[serde(default)]
    pub source: SourceConfig,

    /// Classification bands
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Escalation rules and cooldowns
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Risk estimator tuning
    #[serde(default)]
    pub risk: RiskConfig,

    /// Notification dispatch
    #[serde(default)]
    pub notify: NotifyConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Provisioning store (containers/users tree)
    #[serde(default)]
    pub store: StoreConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$COLDCHAIN_CONFIG` environment variable
    /// 2. `./coldchain.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("COLDCHAIN_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), container = %config.container.id, "Loaded config from COLDCHAIN_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from COLDCHAIN_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "COLDCHAIN_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./coldchain.toml
        let local = PathBuf::from("coldchain.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(container = %config.container.id, "Loaded config from ./coldchain.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./coldchain.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No coldchain.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; range and ordering errors fail.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(&config);
        for w in &range_warnings {
            warn!("{}", w);
        }
        if !range_errors.is_empty() {
            return Err(ConfigError::Validation(range_errors));
        }
        Ok(config)
    }

    /// Apply environment overrides for endpoints and recipients.
    ///
    /// Credentials never live in the TOML file; they are read here.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("COLDCHAIN_DB_URL") {
            self.source.base_url = url.clone();
            self.store.database_url = url;
        }
        if let Some(token) = non_empty_env("COLDCHAIN_DB_AUTH") {
            self.store.auth_token = Some(token);
        }
        if let Some(url) = non_empty_env("COLDCHAIN_RELAY_URL") {
            self.notify.relay_url = url;
        }
        if let Some(to) = non_empty_env("ALERT_EMAIL_TO") {
            self.notify.email_to = Some(to);
        }
        if let Some(to) = non_empty_env("ALERT_SMS_TO") {
            self.notify.sms_to = Some(to);
        }
        if let Some(addr) = non_empty_env("COLDCHAIN_SERVER_ADDR") {
            self.server.addr = addr;
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - Bands must nest: warning_low <= safe_min < safe_max <= warning_high
    /// - Escalation temperatures must be strictly increasing
    /// - Cooldowns, windows and capacities must be positive
    /// - A fixed baseline needs a baseline temperature
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let e = &self.escalation;
        let r = &self.risk;
        let mut errors: Vec<String> = Vec::new();

        if t.safe_min >= t.safe_max {
            errors.push(format!(
                "thresholds.safe_min ({:.1}) must be less than safe_max ({:.1})",
                t.safe_min, t.safe_max
            ));
        }
        if t.warning_low > t.safe_min {
            errors.push(format!(
                "thresholds.warning_low ({:.1}) must not exceed safe_min ({:.1})",
                t.warning_low, t.safe_min
            ));
        }
        if t.warning_high < t.safe_max {
            errors.push(format!(
                "thresholds.warning_high ({:.1}) must not be below safe_max ({:.1})",
                t.warning_high, t.safe_max
            ));
        }
        if t.trend_deadband < 0.0 {
            errors.push(format!(
                "thresholds.trend_deadband ({:.2}) cannot be negative",
                t.trend_deadband
            ));
        }

        Self::check_escalation(e.near_upper_temp, e.above_optimal_temp, "near_upper_temp", "above_optimal_temp", &mut errors);
        Self::check_escalation(e.above_optimal_temp, e.above_safe_temp, "above_optimal_temp", "above_safe_temp", &mut errors);
        Self::check_escalation(e.above_safe_temp, e.extreme_temp, "above_safe_temp", "extreme_temp", &mut errors);

        if e.spike_delta <= 0.0 {
            errors.push(format!("escalation.spike_delta ({:.2}) must be > 0", e.spike_delta));
        }
        if e.deviation_limit <= 0.0 {
            errors.push(format!(
                "escalation.deviation_limit ({:.2}) must be > 0",
                e.deviation_limit
            ));
        }
        if e.cooldown_secs == 0 || e.watch_cooldown_secs == 0 {
            errors.push("escalation cooldowns must be > 0 seconds".to_string());
        }
        if e.alert_log_capacity == 0 {
            errors.push("escalation.alert_log_capacity must be > 0".to_string());
        }
        if e.baseline_mode == BaselineMode::Fixed && e.baseline_temp.is_none() {
            errors.push("escalation.baseline_mode = \"fixed\" requires escalation.baseline_temp".to_string());
        }

        if r.spoilage_window == 0 {
            errors.push("risk.spoilage_window must be > 0".to_string());
        }
        if r.spoilage_window > r.history_window {
            errors.push(format!(
                "risk.spoilage_window ({}) must not exceed history_window ({})",
                r.spoilage_window, r.history_window
            ));
        }
        if r.breach_limit_temp <= t.safe_max {
            errors.push(format!(
                "risk.breach_limit_temp ({:.1}) must be above safe_max ({:.1})",
                r.breach_limit_temp, t.safe_max
            ));
        }

        if self.source.poll_interval_secs == 0 {
            errors.push("source.poll_interval_secs must be > 0".to_string());
        }
        if self.source.fetch_limit == 0 {
            errors.push("source.fetch_limit must be > 0".to_string());
        }
        if self.notify.dispatch_timeout_secs == 0 {
            errors.push("notify.dispatch_timeout_secs must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(lower: f64, upper: f64, lower_name: &str, upper_name: &str, errors: &mut Vec<String>) {
        if lower >= upper {
            errors.push(format!(
                "escalation.{lower_name} ({lower:.1}) must be less than escalation.{upper_name} ({upper:.1})"
            ));
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Container Info
// ============================================================================

/// Identification metadata — appears in logs, alerts and notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container identifier
    #[serde(default = "default_container_id")]
    pub id: String,

    /// Display name used in notification subjects
    #[serde(default)]
    pub name: String,
}

fn default_container_id() -> String {
    "CONTAINER-001".to_string()
}

impl Default for ContainerInfo {
    fn default() -> Self {
        Self {
            id: default_container_id(),
            name: String::new(),
        }
    }
}

// ============================================================================
// Source
// ============================================================================

/// Realtime database endpoint the readings are polled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the realtime database (no trailing `.json`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tree path holding the reading log
    #[serde(default = "default_sensor_path")]
    pub sensor_path: String,

    /// Readings requested per poll (`limitToLast`)
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// HTTP timeout per fetch
    #[serde(default = "default_http_timeout")]
    pub request_timeout_secs: u64,

    /// Chart buffer capacity
    #[serde(default = "default_chart_capacity")]
    pub chart_capacity: usize,
}

fn default_base_url() -> String {
    "http://localhost:9000".to_string()
}
fn default_sensor_path() -> String {
    "sensor_logs".to_string()
}
fn default_fetch_limit() -> usize { defaults::FETCH_LIMIT }
fn default_poll_interval() -> u64 { defaults::POLL_INTERVAL_SECS }
fn default_http_timeout() -> u64 { defaults::HTTP_TIMEOUT_SECS }
fn default_chart_capacity() -> usize { defaults::CHART_CAPACITY }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sensor_path: default_sensor_path(),
            fetch_limit: default_fetch_limit(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_http_timeout(),
            chart_capacity: default_chart_capacity(),
        }
    }
}

// ============================================================================
// Classification Thresholds
// ============================================================================

/// Status bands and trend deadband.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_safe_min")]
    pub safe_min: f64,
    #[serde(default = "default_safe_max")]
    pub safe_max: f64,
    #[serde(default = "default_warning_low")]
    pub warning_low: f64,
    #[serde(default = "default_warning_high")]
    pub warning_high: f64,
    /// Changes below this magnitude are reported as steady
    #[serde(default = "default_trend_deadband")]
    pub trend_deadband: f64,
}

fn default_safe_min() -> f64 { defaults::SAFE_MIN_C }
fn default_safe_max() -> f64 { defaults::SAFE_MAX_C }
fn default_warning_low() -> f64 { defaults::WARNING_LOW_C }
fn default_warning_high() -> f64 { defaults::WARNING_HIGH_C }
fn default_trend_deadband() -> f64 { defaults::TREND_DEADBAND_C }

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            safe_min: default_safe_min(),
            safe_max: default_safe_max(),
            warning_low: default_warning_low(),
            warning_high: default_warning_high(),
            trend_deadband: default_trend_deadband(),
        }
    }
}

// ============================================================================
// Escalation
// ============================================================================

/// How the deviation baseline is established.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMode {
    /// No baseline; deviation rule never fires
    Disabled,
    /// First ingested reading of the session
    #[default]
    FirstReading,
    /// Operator-supplied `baseline_temp`
    Fixed,
}

/// Escalation rule thresholds and cooldowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_spike_delta")]
    pub spike_delta: f64,
    #[serde(default = "default_deviation_limit")]
    pub deviation_limit: f64,
    #[serde(default = "default_extreme_temp")]
    pub extreme_temp: f64,
    #[serde(default = "default_above_safe_temp")]
    pub above_safe_temp: f64,
    #[serde(default = "default_above_optimal_temp")]
    pub above_optimal_temp: f64,
    #[serde(default = "default_near_upper_temp")]
    pub near_upper_temp: f64,
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "default_watch_cooldown")]
    pub watch_cooldown_secs: u64,
    #[serde(default = "default_alert_log_capacity")]
    pub alert_log_capacity: usize,
    #[serde(default)]
    pub baseline_mode: BaselineMode,
    #[serde(default)]
    pub baseline_temp: Option<f64>,
}

fn default_spike_delta() -> f64 { defaults::SPIKE_DELTA_C }
fn default_deviation_limit() -> f64 { defaults::DEVIATION_LIMIT_C }
fn default_extreme_temp() -> f64 { defaults::EXTREME_TEMP_C }
fn default_above_safe_temp() -> f64 { defaults::ABOVE_SAFE_TEMP_C }
fn default_above_optimal_temp() -> f64 { defaults::ABOVE_OPTIMAL_TEMP_C }
fn default_near_upper_temp() -> f64 { defaults::NEAR_UPPER_TEMP_C }
fn default_cooldown() -> u64 { defaults::ALERT_COOLDOWN_SECS }
fn default_watch_cooldown() -> u64 { defaults::WATCH_COOLDOWN_SECS }
fn default_alert_log_capacity() -> usize { defaults::ALERT_LOG_CAPACITY }

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            spike_delta: default_spike_delta(),
            deviation_limit: default_deviation_limit(),
            extreme_temp: default_extreme_temp(),
            above_safe_temp: default_above_safe_temp(),
            above_optimal_temp: default_above_optimal_temp(),
            near_upper_temp: default_near_upper_temp(),
            cooldown_secs: default_cooldown(),
            watch_cooldown_secs: default_watch_cooldown(),
            alert_log_capacity: default_alert_log_capacity(),
            baseline_mode: BaselineMode::default(),
            baseline_temp: None,
        }
    }
}

// ============================================================================
// Risk
// ============================================================================

/// Risk estimator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Rolling window retained for spoilage estimation
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Most recent samples averaged by the spoilage estimator
    #[serde(default = "default_spoilage_window")]
    pub spoilage_window: usize,
    /// Projected breach temperature for the medium band
    #[serde(default = "default_breach_limit")]
    pub breach_limit_temp: f64,
    /// Minutes per degree of headroom below the breach limit
    #[serde(default = "default_breach_minutes")]
    pub breach_minutes_per_degree: f64,
}

fn default_history_window() -> usize { defaults::HISTORY_WINDOW }
fn default_spoilage_window() -> usize { defaults::SPOILAGE_WINDOW }
fn default_breach_limit() -> f64 { defaults::BREACH_LIMIT_C }
fn default_breach_minutes() -> f64 { defaults::BREACH_MINUTES_PER_DEGREE }

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            spoilage_window: default_spoilage_window(),
            breach_limit_temp: default_breach_limit(),
            breach_minutes_per_degree: default_breach_minutes(),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Notification dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base URL of the notification relay
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Alert email recipient; email channel is skipped when unset
    #[serde(default)]
    pub email_to: Option<String>,
    /// Alert SMS recipient; SMS channel is skipped when unset
    #[serde(default)]
    pub sms_to: Option<String>,
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,
    /// First line of every outbound message
    #[serde(default = "default_signature")]
    pub signature: String,
    #[serde(default = "default_toast_capacity")]
    pub toast_capacity: usize,
}

fn default_relay_url() -> String {
    format!("http://localhost:{}", defaults::RELAY_PORT)
}
fn default_dispatch_timeout() -> u64 { defaults::DISPATCH_TIMEOUT_SECS }
fn default_signature() -> String {
    "Cold-chain monitoring alert".to_string()
}
fn default_toast_capacity() -> usize { defaults::TOAST_CAPACITY }

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            email_to: None,
            sms_to: None,
            dispatch_timeout_secs: default_dispatch_timeout(),
            signature: default_signature(),
            toast_capacity: default_toast_capacity(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Provisioning store (the same realtime database, `containers/` and `users/` trees).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_base_url")]
    pub database_url: String,
    /// Database auth token, only ever taken from `COLDCHAIN_DB_AUTH`
    #[serde(skip)]
    pub auth_token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_base_url(),
            auth_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
[escalation]
cooldown_secs = 120
"#,
        )
        .unwrap();
        assert_eq!(config.escalation.cooldown_secs, 120);
        assert_eq!(config.escalation.watch_cooldown_secs, 1_800);
        assert!((config.thresholds.trend_deadband - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_bands_rejected() {
        let mut config = MonitorConfig::default();
        config.thresholds.safe_min = 9.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("safe_min"));
    }

    #[test]
    fn escalation_temps_must_increase() {
        let mut config = MonitorConfig::default();
        config.escalation.above_optimal_temp = 11.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("above_optimal_temp"));
    }

    #[test]
    fn fixed_baseline_requires_temperature() {
        let mut config = MonitorConfig::default();
        config.escalation.baseline_mode = BaselineMode::Fixed;
        assert!(config.validate().is_err());
        config.escalation.baseline_temp = Some(5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn baseline_mode_parses_snake_case() {
        let config = MonitorConfig::from_toml_str(
            r#"
[escalation]
baseline_mode = "fixed"
baseline_temp = 4.5
"#,
        )
        .unwrap();
        assert_eq!(config.escalation.baseline_mode, BaselineMode::Fixed);
        assert_eq!(config.escalation.baseline_temp, Some(4.5));
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let mut config = MonitorConfig::default();
        config.container.id = "TS-2024-00142".to_string();
        let text = config.to_toml().unwrap();
        let back = MonitorConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.container.id, "TS-2024-00142");
    }
}
