//! Status band and trend classification

use crate::config::ThresholdConfig;
use crate::types::{Status, Trend};

/// Classify a temperature against the default bands.
///
/// - SAFE: `2 <= t <= 8`
/// - WARNING: `8 < t <= 10` or `0 <= t < 2`
/// - CRITICAL: everything else (including non-finite values)
pub fn classify(temp: f64) -> Status {
    Classifier::default().classify(temp)
}

/// Trend of `current` relative to `previous` with the default 0.3 °C deadband.
pub fn trend(current: f64, previous: Option<f64>) -> Trend {
    Classifier::default().trend(current, previous)
}

/// Threshold-configured classifier.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: ThresholdConfig,
}

impl Classifier {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn classify(&self, temp: f64) -> Status {
        let t = &self.thresholds;
        if temp >= t.safe_min && temp <= t.safe_max {
            Status::Safe
        } else if (temp > t.safe_max && temp <= t.warning_high)
            || (temp >= t.warning_low && temp < t.safe_min)
        {
            Status::Warning
        } else {
            Status::Critical
        }
    }

    /// Steady when there is no previous reading or the change is inside the deadband.
    pub fn trend(&self, current: f64, previous: Option<f64>) -> Trend {
        let Some(previous) = previous else {
            return Trend::Steady;
        };
        let diff = current - previous;
        if diff.abs() < self.thresholds.trend_deadband || diff.is_nan() {
            Trend::Steady
        } else if diff > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_band_is_inclusive() {
        for t in [2.0, 4.5, 8.0] {
            assert_eq!(classify(t), Status::Safe, "temp {t}");
        }
    }

    #[test]
    fn warning_bands() {
        for t in [8.01, 9.2, 10.0, 0.0, 1.99] {
            assert_eq!(classify(t), Status::Warning, "temp {t}");
        }
    }

    #[test]
    fn critical_outside_warning_bands() {
        for t in [-0.01, -20.0, 10.01, 14.5, 40.0, f64::NAN] {
            assert_eq!(classify(t), Status::Critical, "temp {t}");
        }
    }

    #[test]
    fn same_value_is_steady() {
        for t in [-5.0, 0.0, 4.2, 12.7] {
            assert_eq!(trend(t, Some(t)), Trend::Steady);
        }
    }

    #[test]
    fn first_reading_is_steady() {
        assert_eq!(trend(9.0, None), Trend::Steady);
    }

    #[test]
    fn deadband_boundary() {
        assert_eq!(trend(5.29, Some(5.0)), Trend::Steady);
        assert_eq!(trend(5.4, Some(5.0)), Trend::Up);
        assert_eq!(trend(4.6, Some(5.0)), Trend::Down);
    }

    #[test]
    fn custom_bands_respected() {
        let classifier = Classifier::new(ThresholdConfig {
            safe_min: -20.0,
            safe_max: -15.0,
            warning_low: -25.0,
            warning_high: -10.0,
            trend_deadband: 0.5,
        });
        assert_eq!(classifier.classify(-18.0), Status::Safe);
        assert_eq!(classifier.classify(-12.0), Status::Warning);
        assert_eq!(classifier.classify(2.0), Status::Critical);
        assert_eq!(classifier.trend(-17.6, Some(-18.0)), Trend::Steady);
    }
}
