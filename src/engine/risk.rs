//! Risk Estimator - deterministic risk table plus spoilage projection
//!
//! The table mirrors the classifier bands:
//!
//! | band                     | level    | time to breach                | confidence |
//! |--------------------------|----------|-------------------------------|------------|
//! | safe                     | Low      | none                          | 95         |
//! | upper warning            | Medium   | `(12 - t) * 12` min, >= 1     | 78         |
//! | lower warning / above 10 | High     | Now                           | 90         |
//! | >= 15 or below 0         | Critical | Now                           | 90         |
//!
//! Spoilage uses the mean of the most recent samples of the rolling window.

use crate::config::{defaults, EscalationConfig, RiskConfig, ThresholdConfig};
use crate::types::{RiskAssessment, RiskLevel, SpoilageAssessment, SpoilageRisk, TimeToBreach, Trend};

// ============================================================================
// Spoilage Bands
// ============================================================================

/// Mean at or above which spoilage is critical (°C).
const SPOILAGE_CRITICAL_MEAN: f64 = 10.0;
/// Mean at or above which spoilage risk is high (°C).
const SPOILAGE_HIGH_MEAN: f64 = 8.5;
/// Mean at or above which spoilage risk is medium (°C).
const SPOILAGE_MEDIUM_MEAN: f64 = 7.5;

/// Smallest denominator used in the hours projection.
const MIN_DENOMINATOR: f64 = 0.1;

const CONFIDENCE_LOW: u8 = 95;
const CONFIDENCE_MEDIUM: u8 = 78;
const CONFIDENCE_HIGH: u8 = 90;

/// Project hours to spoilage as `max(floor, round(numerator / (mean - offset)))`.
fn projected_hours(mean: f64, numerator: f64, offset: f64, floor: u32) -> u32 {
    let denominator = (mean - offset).max(MIN_DENOMINATOR);
    let hours = (numerator / denominator).round();
    if hours.is_finite() {
        (hours.clamp(0.0, f64::from(u32::MAX)) as u32).max(floor)
    } else {
        floor
    }
}

/// Spoilage estimate from a rolling temperature history (oldest first).
///
/// Fewer than `window` samples yields a LOW "insufficient data" result.
pub fn estimate_spoilage(history: &[f64], window: usize) -> SpoilageAssessment {
    let window = window.max(1);
    if history.len() < window {
        return SpoilageAssessment {
            risk: SpoilageRisk::Low,
            hours_to_spoilage: None,
            window_mean: None,
            message: "Insufficient data for spoilage calculation".to_string(),
        };
    }

    let recent = &history[history.len() - window..];
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;

    let (risk, hours, message) = if mean >= SPOILAGE_CRITICAL_MEAN {
        let hours = projected_hours(mean, 24.0, 8.0, 1);
        (
            SpoilageRisk::Critical,
            Some(hours),
            format!("HIGH SPOILAGE RISK! Products may spoil in {hours} hours"),
        )
    } else if mean >= SPOILAGE_HIGH_MEAN {
        let hours = projected_hours(mean, 48.0, 7.0, 4);
        (
            SpoilageRisk::High,
            Some(hours),
            format!("Medium spoilage risk. Estimated spoilage in {hours} hours"),
        )
    } else if mean >= SPOILAGE_MEDIUM_MEAN {
        let hours = projected_hours(mean, 72.0, 6.0, 12);
        (
            SpoilageRisk::Medium,
            Some(hours),
            format!("Low spoilage risk. Monitor closely. Safe for {hours} hours"),
        )
    } else {
        (
            SpoilageRisk::Low,
            None,
            "No spoilage risk detected. Products are safe.".to_string(),
        )
    };

    SpoilageAssessment {
        risk,
        hours_to_spoilage: hours,
        window_mean: Some(mean),
        message,
    }
}

// ============================================================================
// Risk Estimator
// ============================================================================

/// Configured risk estimator.
#[derive(Debug, Clone)]
pub struct RiskEstimator {
    thresholds: ThresholdConfig,
    risk: RiskConfig,
    watch_temp: f64,
    critical_temp: f64,
}

impl Default for RiskEstimator {
    fn default() -> Self {
        Self::new(
            ThresholdConfig::default(),
            RiskConfig::default(),
            &EscalationConfig::default(),
        )
    }
}

impl RiskEstimator {
    pub fn new(thresholds: ThresholdConfig, risk: RiskConfig, escalation: &EscalationConfig) -> Self {
        Self {
            thresholds,
            risk,
            watch_temp: escalation.near_upper_temp,
            critical_temp: escalation.extreme_temp,
        }
    }

    pub fn spoilage(&self, history: &[f64]) -> SpoilageAssessment {
        estimate_spoilage(history, self.risk.spoilage_window)
    }

    /// Full assessment for the current temperature, trend and rolling history.
    pub fn estimate_risk(&self, temp: f64, trend: Trend, history: &[f64]) -> RiskAssessment {
        let t = &self.thresholds;
        let spoilage = self.spoilage(history);

        if temp >= t.safe_min && temp <= t.safe_max {
            let recommendation = if temp >= self.watch_temp {
                "Monitor: Temperature near upper limit. Watch for spoilage risk."
            } else if trend == Trend::Up {
                "Temperature within safe range but rising. Keep monitoring."
            } else {
                "No action required. Container temperature stable."
            };
            return RiskAssessment {
                risk_level: RiskLevel::Low,
                time_to_breach: None,
                recommendation: recommendation.to_string(),
                confidence: CONFIDENCE_LOW,
                spoilage,
            };
        }

        if temp > t.safe_max && temp <= t.warning_high {
            let minutes = ((self.risk.breach_limit_temp - temp) * self.risk.breach_minutes_per_degree)
                .round()
                .clamp(1.0, f64::from(u32::MAX)) as u32;
            let recommendation = if trend == Trend::Down {
                "Temperature above optimal but falling. Confirm cooling has recovered."
            } else {
                "Monitor closely. Consider cooling measures if trend continues."
            };
            return RiskAssessment {
                risk_level: RiskLevel::Medium,
                time_to_breach: Some(TimeToBreach::Minutes(minutes)),
                recommendation: recommendation.to_string(),
                confidence: CONFIDENCE_MEDIUM,
                spoilage,
            };
        }

        let (risk_level, recommendation) = if temp >= self.critical_temp {
            (
                RiskLevel::Critical,
                "EMERGENCY: Temperature critically high! Immediate action required to prevent complete spoilage.".to_string(),
            )
        } else if temp > t.warning_high {
            (
                RiskLevel::High,
                format!(
                    "Temperature above {:.0}°C. High spoilage risk. Activate emergency cooling immediately.",
                    t.warning_high
                ),
            )
        } else if temp >= t.warning_low {
            (
                RiskLevel::High,
                "Temperature below safe range. Check for over-cooling before products freeze.".to_string(),
            )
        } else {
            (
                RiskLevel::Critical,
                "EMERGENCY: Temperature below freezing. Immediate action required to prevent freeze damage.".to_string(),
            )
        };

        RiskAssessment {
            risk_level,
            time_to_breach: Some(TimeToBreach::Now),
            recommendation,
            confidence: CONFIDENCE_HIGH,
            spoilage,
        }
    }
}

/// Assessment shown before any reading has arrived.
pub fn waiting_assessment() -> RiskAssessment {
    RiskAssessment {
        risk_level: RiskLevel::Low,
        time_to_breach: None,
        recommendation: "Waiting for sensor data...".to_string(),
        confidence: CONFIDENCE_LOW,
        spoilage: estimate_spoilage(&[], defaults::SPOILAGE_WINDOW),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> RiskEstimator {
        RiskEstimator::default()
    }

    #[test]
    fn safe_band_is_low_risk() {
        let r = estimator().estimate_risk(5.0, Trend::Steady, &[]);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert_eq!(r.time_to_breach, None);
        assert_eq!(r.confidence, 95);
    }

    #[test]
    fn near_upper_limit_switches_recommendation() {
        let r = estimator().estimate_risk(7.8, Trend::Steady, &[]);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert!(r.recommendation.contains("near upper limit"));
    }

    #[test]
    fn medium_band_projects_breach_minutes() {
        let r = estimator().estimate_risk(9.0, Trend::Up, &[]);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert_eq!(r.time_to_breach, Some(TimeToBreach::Minutes(36)));
        assert_eq!(r.confidence, 78);
    }

    #[test]
    fn breach_minutes_never_below_one() {
        let est = RiskEstimator::new(
            ThresholdConfig::default(),
            RiskConfig {
                breach_limit_temp: 9.0,
                ..RiskConfig::default()
            },
            &EscalationConfig::default(),
        );
        let r = est.estimate_risk(10.0, Trend::Up, &[]);
        assert_eq!(r.time_to_breach, Some(TimeToBreach::Minutes(1)));
    }

    #[test]
    fn outside_warning_is_high_or_critical_now() {
        let high = estimator().estimate_risk(12.0, Trend::Up, &[]);
        assert_eq!(high.risk_level, RiskLevel::High);
        assert_eq!(high.time_to_breach, Some(TimeToBreach::Now));
        assert_eq!(high.confidence, 90);

        let low_side = estimator().estimate_risk(1.0, Trend::Down, &[]);
        assert_eq!(low_side.risk_level, RiskLevel::High);

        assert_eq!(
            estimator().estimate_risk(15.0, Trend::Up, &[]).risk_level,
            RiskLevel::Critical
        );
        assert_eq!(
            estimator().estimate_risk(-3.0, Trend::Down, &[]).risk_level,
            RiskLevel::Critical
        );
    }

    #[test]
    fn spoilage_high_band_has_finite_hours() {
        let s = estimate_spoilage(&[9.0; 6], 6);
        assert_eq!(s.risk, SpoilageRisk::High);
        let hours = s.hours_to_spoilage.unwrap();
        assert!(hours >= 4);
        assert_eq!(hours, 24);
    }

    #[test]
    fn spoilage_insufficient_history_is_low() {
        let s = estimate_spoilage(&[20.0, 20.0, 20.0, 20.0, 20.0], 6);
        assert_eq!(s.risk, SpoilageRisk::Low);
        assert!(s.is_insufficient());
        assert!(s.hours_to_spoilage.is_none());
    }

    #[test]
    fn spoilage_uses_most_recent_window() {
        let history = [3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0];
        let s = estimate_spoilage(&history, 6);
        assert_eq!(s.risk, SpoilageRisk::Critical);
        assert_eq!(s.hours_to_spoilage, Some(6));
    }

    #[test]
    fn spoilage_medium_and_low_bands() {
        let medium = estimate_spoilage(&[8.0; 6], 6);
        assert_eq!(medium.risk, SpoilageRisk::Medium);
        assert_eq!(medium.hours_to_spoilage, Some(36));

        let low = estimate_spoilage(&[4.0; 6], 6);
        assert_eq!(low.risk, SpoilageRisk::Low);
        assert!(!low.is_insufficient());
    }

    #[test]
    fn spoilage_critical_floor_is_one_hour() {
        let s = estimate_spoilage(&[40.0; 6], 6);
        assert_eq!(s.hours_to_spoilage, Some(1));
    }

    #[test]
    fn risk_never_blocked_by_insufficient_history() {
        let r = estimator().estimate_risk(12.0, Trend::Up, &[12.0]);
        assert_eq!(r.risk_level, RiskLevel::High);
        assert!(r.spoilage.is_insufficient());
    }
}
