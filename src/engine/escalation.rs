//! Escalation Engine - decides per reading whether an alert fires
//!
//! Owns every piece of mutable escalation state (baseline, cooldown table,
//! alert log) so several containers can be monitored side by side.
//!
//! Per evaluated reading:
//! 1. Establish the baseline (first reading, when enabled)
//! 2. Skip when there is no previous temperature
//! 3. Pick the highest-priority matching rule
//! 4. Suppress when its cooldown bucket fired within the rule's TTL
//! 5. Otherwise build the AlertEvent and prepend it to the bounded log

use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info, warn};

use crate::config::{BaselineMode, EscalationConfig};
use crate::engine::cooldown::{CooldownKey, CooldownTable};
use crate::engine::rules::{RuleContext, RuleTable};
use crate::types::{AlertEvent, AlertKind, Channel, Priority, Reading, SpoilageAssessment};

/// Spoilage note attached to extreme-temperature alerts.
const IMMINENT_SPOILAGE: &str =
    "IMMEDIATE SPOILAGE RISK! Products will spoil within 1-2 hours if not cooled immediately.";

pub struct EscalationEngine {
    container_id: String,
    rules: RuleTable,
    cooldowns: CooldownTable,
    baseline_mode: BaselineMode,
    baseline: Option<f64>,
    alert_log: VecDeque<AlertEvent>,
    capacity: usize,
    suppressed: u64,
}

impl EscalationEngine {
    pub fn new(container_id: impl Into<String>, config: &EscalationConfig) -> Self {
        let baseline = match config.baseline_mode {
            BaselineMode::Fixed => config.baseline_temp,
            BaselineMode::FirstReading | BaselineMode::Disabled => None,
        };
        Self::with_rules(container_id, config, RuleTable::from_config(config)).with_baseline(baseline)
    }

    /// Build with a custom rule table.
    pub fn with_rules(container_id: impl Into<String>, config: &EscalationConfig, rules: RuleTable) -> Self {
        let capacity = config.alert_log_capacity.max(1);
        Self {
            container_id: container_id.into(),
            rules,
            cooldowns: CooldownTable::new(),
            baseline_mode: config.baseline_mode,
            baseline: None,
            alert_log: VecDeque::with_capacity(capacity),
            capacity,
            suppressed: 0,
        }
    }

    fn with_baseline(mut self, baseline: Option<f64>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Offer a temperature as the session baseline.
    ///
    /// Only the first offer in `first_reading` mode takes effect.
    pub fn observe_baseline(&mut self, temperature: f64) {
        if self.baseline_mode == BaselineMode::FirstReading
            && self.baseline.is_none()
            && temperature.is_finite()
        {
            info!(
                container = %self.container_id,
                baseline = temperature,
                "[Escalation] Baseline established"
            );
            self.baseline = Some(temperature);
        }
    }

    /// Evaluate one new reading. Returns the alert when one fires.
    pub fn evaluate(
        &mut self,
        reading: &Reading,
        previous: Option<f64>,
        spoilage: &SpoilageAssessment,
    ) -> Option<AlertEvent> {
        self.observe_baseline(reading.temperature);

        let previous = previous?;
        let ctx = RuleContext {
            temperature: reading.temperature,
            previous,
            baseline: self.baseline,
        };
        let rule = self.rules.first_match(&ctx)?;

        let key = CooldownKey::for_rule(rule, reading.temperature);
        if self.cooldowns.is_suppressed(&key, reading.timestamp, rule.cooldown_secs) {
            self.suppressed += 1;
            debug!(
                container = %self.container_id,
                kind = rule.kind.short_code(),
                temp = reading.temperature,
                "[Escalation] Alert suppressed by cooldown"
            );
            return None;
        }
        self.cooldowns.record(key, reading.timestamp);

        let spoilage_info = match rule.kind {
            AlertKind::Extreme => Some(IMMINENT_SPOILAGE.to_string()),
            AlertKind::Spike => None,
            _ => Some(spoilage.message.clone()),
        };

        let alert = AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            container_id: self.container_id.clone(),
            kind: rule.kind,
            priority: rule.priority,
            subject: rule.subject().to_string(),
            message: rule.message(&ctx),
            temperature: reading.temperature,
            previous_temperature: Some(previous),
            timestamp: reading.timestamp,
            spoilage_info,
            channels_sent: BTreeSet::new(),
        };

        if alert.priority == Priority::High {
            warn!(
                container = %self.container_id,
                kind = alert.kind.short_code(),
                temp = alert.temperature,
                "[Escalation] 🚨 {}",
                alert.subject
            );
        } else {
            info!(
                container = %self.container_id,
                kind = alert.kind.short_code(),
                priority = %alert.priority,
                temp = alert.temperature,
                "[Escalation] {}",
                alert.subject
            );
        }

        self.alert_log.push_front(alert.clone());
        self.alert_log.truncate(self.capacity);
        Some(alert)
    }

    /// Alert log, newest first.
    pub fn alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.alert_log.iter()
    }

    pub fn alert_count(&self) -> usize {
        self.alert_log.len()
    }

    /// Alerts dropped by cooldown since the engine started.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Record the channels that accepted a logged alert.
    ///
    /// Returns false when the alert already aged out of the log.
    pub fn mark_delivered(&mut self, alert_id: &str, channels: &BTreeSet<Channel>) -> bool {
        match self.alert_log.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.channels_sent.extend(channels.iter().copied());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::risk::estimate_spoilage;

    fn no_history() -> SpoilageAssessment {
        estimate_spoilage(&[], 6)
    }

    fn engine(mode: BaselineMode) -> EscalationEngine {
        let config = EscalationConfig {
            baseline_mode: mode,
            ..EscalationConfig::default()
        };
        EscalationEngine::new("TS-1", &config)
    }

    #[test]
    fn first_reading_sets_baseline_and_never_alerts() {
        let mut e = engine(BaselineMode::FirstReading);
        let alert = e.evaluate(&Reading::new("a", 100, 16.0), None, &no_history());
        assert!(alert.is_none());
        assert_eq!(e.baseline(), Some(16.0));

        e.evaluate(&Reading::new("b", 200, 4.0), Some(16.0), &no_history());
        assert_eq!(e.baseline(), Some(16.0));
    }

    #[test]
    fn fixed_baseline_used_from_start() {
        let config = EscalationConfig {
            baseline_mode: BaselineMode::Fixed,
            baseline_temp: Some(5.0),
            ..EscalationConfig::default()
        };
        let mut e = EscalationEngine::new("TS-1", &config);
        assert_eq!(e.baseline(), Some(5.0));
        e.observe_baseline(9.0);
        assert_eq!(e.baseline(), Some(5.0));
    }

    #[test]
    fn disabled_baseline_never_set() {
        let mut e = engine(BaselineMode::Disabled);
        e.observe_baseline(5.0);
        assert_eq!(e.baseline(), None);
    }

    #[test]
    fn repeated_deviation_fires_once_per_window() {
        let mut e = engine(BaselineMode::FirstReading);
        e.observe_baseline(3.0);

        let first = e.evaluate(&Reading::new("a", 200, 9.0), Some(8.5), &no_history());
        let first = first.unwrap();
        assert_eq!(first.kind, AlertKind::BaselineDeviation);
        assert_eq!(first.priority, Priority::Medium);

        for t in [205, 260, 350, 499] {
            assert!(e.evaluate(&Reading::new("r", t, 9.0), Some(9.0), &no_history()).is_none());
        }
        assert_eq!(e.alert_count(), 1);
        assert_eq!(e.suppressed_count(), 4);

        assert!(e.evaluate(&Reading::new("z", 500, 9.0), Some(9.0), &no_history()).is_some());
    }

    #[test]
    fn high_band_wins_over_session_baseline_deviation() {
        let mut e = engine(BaselineMode::FirstReading);
        e.observe_baseline(5.0);

        let above_safe = e
            .evaluate(&Reading::new("a", 200, 12.0), Some(8.0), &no_history())
            .unwrap();
        assert_eq!(above_safe.kind, AlertKind::AboveSafeLimit);
        assert_eq!(above_safe.priority, Priority::High);

        let extreme = e
            .evaluate(&Reading::new("b", 300, 16.0), Some(12.0), &no_history())
            .unwrap();
        assert_eq!(extreme.kind, AlertKind::Extreme);
        assert_eq!(extreme.priority, Priority::High);
    }

    #[test]
    fn watch_alert_uses_thirty_minute_cooldown() {
        let mut e = engine(BaselineMode::Disabled);
        assert!(e.evaluate(&Reading::new("a", 0, 7.6), Some(7.0), &no_history()).is_some());
        // Different half-degree bucket, same watch key
        assert!(e.evaluate(&Reading::new("b", 600, 8.1), Some(7.6), &no_history()).is_none());
        assert!(e.evaluate(&Reading::new("c", 1_800, 7.9), Some(8.1), &no_history()).is_some());
    }

    #[test]
    fn alert_log_is_bounded_newest_first() {
        let mut e = engine(BaselineMode::Disabled);
        let mut previous = 4.0;
        for i in 0..15u64 {
            // Alternate far apart so every reading spikes into a fresh bucket
            let temp = if i % 2 == 0 { 20.0 + i as f64 } else { 4.0 + i as f64 * 0.5 };
            e.evaluate(&Reading::new(format!("r{i}"), 100 + i, temp), Some(previous), &no_history());
            previous = temp;
        }
        assert_eq!(e.alert_count(), 10);
        let newest = e.alerts().next().unwrap();
        assert_eq!(newest.timestamp, 114);
        let oldest = e.alerts().last().unwrap();
        assert_eq!(oldest.timestamp, 105);
    }

    #[test]
    fn extreme_alert_carries_imminent_spoilage_note() {
        let mut e = engine(BaselineMode::Disabled);
        let alert = e
            .evaluate(&Reading::new("a", 100, 16.0), Some(14.0), &no_history())
            .unwrap();
        assert_eq!(alert.kind, AlertKind::Extreme);
        assert!(alert.spoilage_info.unwrap().contains("IMMEDIATE SPOILAGE RISK"));
    }

    #[test]
    fn mark_delivered_updates_logged_alert() {
        let mut e = engine(BaselineMode::Disabled);
        let alert = e
            .evaluate(&Reading::new("a", 100, 12.0), Some(11.0), &no_history())
            .unwrap();
        let channels: BTreeSet<Channel> = [Channel::InApp, Channel::Email].into_iter().collect();
        assert!(e.mark_delivered(&alert.id, &channels));
        assert_eq!(e.alerts().next().unwrap().channels_sent, channels);
        assert!(!e.mark_delivered("missing", &channels));
    }
}
