//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Any new field added to MonitorConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [container]
        "container",
        "container.id",
        "container.name",
        // [source]
        "source",
        "source.base_url",
        "source.sensor_path",
        "source.fetch_limit",
        "source.poll_interval_secs",
        "source.request_timeout_secs",
        "source.chart_capacity",
        // [thresholds]
        "thresholds",
        "thresholds.safe_min",
        "thresholds.safe_max",
        "thresholds.warning_low",
        "thresholds.warning_high",
        "thresholds.trend_deadband",
        // [escalation]
        "escalation",
        "escalation.spike_delta",
        "escalation.deviation_limit",
        "escalation.extreme_temp",
        "escalation.above_safe_temp",
        "escalation.above_optimal_temp",
        "escalation.near_upper_temp",
        "escalation.cooldown_secs",
        "escalation.watch_cooldown_secs",
        "escalation.alert_log_capacity",
        "escalation.baseline_mode",
        "escalation.baseline_temp",
        // [risk]
        "risk",
        "risk.history_window",
        "risk.spoilage_window",
        "risk.breach_limit_temp",
        "risk.breach_minutes_per_degree",
        // [notify]
        "notify",
        "notify.relay_url",
        "notify.email_to",
        "notify.sms_to",
        "notify.dispatch_timeout_secs",
        "notify.signature",
        "notify.toast_capacity",
        // [server]
        "server",
        "server.addr",
        // [store]
        "store",
        "store.database_url",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; parse errors are left to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Refrigerated transport sensors report roughly this range (°C).
const SENSOR_MIN_C: f64 = -40.0;
const SENSOR_MAX_C: f64 = 60.0;

/// Validate physical ranges on a parsed MonitorConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::MonitorConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let t = &config.thresholds;
    let e = &config.escalation;

    let temps = [
        ("thresholds.safe_min", t.safe_min),
        ("thresholds.safe_max", t.safe_max),
        ("thresholds.warning_low", t.warning_low),
        ("thresholds.warning_high", t.warning_high),
        ("escalation.extreme_temp", e.extreme_temp),
        ("escalation.above_safe_temp", e.above_safe_temp),
        ("escalation.above_optimal_temp", e.above_optimal_temp),
        ("escalation.near_upper_temp", e.near_upper_temp),
        ("risk.breach_limit_temp", config.risk.breach_limit_temp),
    ];
    for (field, value) in temps {
        if !value.is_finite() || !(SENSOR_MIN_C..=SENSOR_MAX_C).contains(&value) {
            errors.push(format!(
                "{field} = {value:.1} is outside physical range ({SENSOR_MIN_C}..{SENSOR_MAX_C} °C)"
            ));
        }
    }

    if let Some(baseline) = e.baseline_temp {
        if !(SENSOR_MIN_C..=SENSOR_MAX_C).contains(&baseline) {
            errors.push(format!(
                "escalation.baseline_temp = {baseline:.1} is outside physical range ({SENSOR_MIN_C}..{SENSOR_MAX_C} °C)"
            ));
        }
    }

    // A deadband wider than the safe band hides every trend
    if t.trend_deadband > (t.safe_max - t.safe_min) {
        warnings.push(ValidationWarning {
            field: "thresholds.trend_deadband".to_string(),
            message: format!(
                "trend_deadband = {:.2} is wider than the safe band ({:.1}..{:.1})",
                t.trend_deadband, t.safe_min, t.safe_max
            ),
            suggestion: None,
        });
    }

    if e.watch_cooldown_secs < e.cooldown_secs {
        warnings.push(ValidationWarning {
            field: "escalation.watch_cooldown_secs".to_string(),
            message: format!(
                "watch_cooldown_secs = {} is shorter than cooldown_secs = {}",
                e.watch_cooldown_secs, e.cooldown_secs
            ),
            suggestion: None,
        });
    }

    if config.source.poll_interval_secs > 300 {
        warnings.push(ValidationWarning {
            field: "source.poll_interval_secs".to_string(),
            message: format!(
                "poll_interval_secs = {} leaves readings unchecked for over five minutes",
                config.source.poll_interval_secs
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("cooldown", "cooldown"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("coldown", "cooldown"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [escalation]
            spike_delta = 4.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"escalation".to_string()));
        assert!(keys.contains(&"escalation.spike_delta".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[escalation]
coldown_secs = 120
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("escalation.cooldown_secs")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[container]
id = "TS-2024-00142"

[thresholds]
safe_max = 8.0

[notify]
email_to = "ops@example.com"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&MonitorConfig::default());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_physical_range_extreme_out_of_range() {
        let mut config = MonitorConfig::default();
        config.escalation.extreme_temp = 150.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("extreme_temp")));
    }

    #[test]
    fn test_short_watch_cooldown_warns() {
        let mut config = MonitorConfig::default();
        config.escalation.watch_cooldown_secs = 60;
        let (_, warnings) = validate_physical_ranges(&config);
        assert!(warnings.iter().any(|w| w.field.contains("watch_cooldown")));
    }
}
