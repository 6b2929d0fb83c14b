//! Ordered escalation rule table
//!
//! The highest-priority matching rule wins; among rules of equal priority the
//! first in table order wins. The default order:
//!
//! 1. spike `>= 5` between consecutive readings (high)
//! 2. `t >= 15` extreme (high)
//! 3. `10 <= t < 15` above safe limit (high)
//! 4. deviation `> 5` from the session baseline (medium)
//! 5. `8.5 <= t < 10` above optimal (medium)
//! 6. `7.5 <= t < 8.5` near upper limit watch (low, kind-wide cooldown)

use crate::config::EscalationConfig;
use crate::types::{AlertKind, Priority};

/// Inputs a rule predicate can look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub temperature: f64,
    pub previous: f64,
    pub baseline: Option<f64>,
}

impl RuleContext {
    pub fn spike(&self) -> f64 {
        (self.temperature - self.previous).abs()
    }

    pub fn deviation(&self) -> Option<f64> {
        self.baseline.map(|b| (self.temperature - b).abs())
    }
}

/// Rule predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// `|t - previous| >= delta`
    SpikeAtLeast(f64),
    /// `|t - baseline| > limit`; never matches without a baseline
    DeviationAbove(f64),
    /// `t >= min`
    TempAtLeast(f64),
    /// `min <= t < max`
    TempInRange { min: f64, max: f64 },
}

impl Condition {
    pub fn matches(&self, ctx: &RuleContext) -> bool {
        match *self {
            Condition::SpikeAtLeast(delta) => ctx.spike() >= delta,
            Condition::DeviationAbove(limit) => ctx.deviation().is_some_and(|d| d > limit),
            Condition::TempAtLeast(min) => ctx.temperature >= min,
            Condition::TempInRange { min, max } => ctx.temperature >= min && ctx.temperature < max,
        }
    }
}

/// How a rule's cooldown bucket is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownScope {
    /// One bucket per half-degree of temperature
    TemperatureBucket,
    /// One bucket for the whole rule
    KindWide,
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct EscalationRule {
    pub kind: AlertKind,
    pub condition: Condition,
    pub priority: Priority,
    pub scope: CooldownScope,
    pub cooldown_secs: u64,
}

impl EscalationRule {
    /// Notification subject line.
    pub fn subject(&self) -> &'static str {
        match self.kind {
            AlertKind::Spike => "Rapid Temperature Change Detected",
            AlertKind::BaselineDeviation => "Temperature Deviating From Baseline",
            AlertKind::Extreme => "CRITICAL: Temperature Extremely High!",
            AlertKind::AboveSafeLimit => "HIGH RISK: Temperature Above Safe Limit",
            AlertKind::AboveOptimal => "Warning: Temperature Rising Above Optimal",
            AlertKind::NearUpperLimit => "Monitoring: Temperature Near Upper Limit",
        }
    }

    /// Alert message for the matched reading.
    pub fn message(&self, ctx: &RuleContext) -> String {
        let t = ctx.temperature;
        match (self.kind, self.condition) {
            (AlertKind::Spike, _) => {
                let direction = if t > ctx.previous { "risen" } else { "dropped" };
                format!(
                    "Temperature {direction} rapidly by {:.1}°C to {t:.1}°C",
                    ctx.spike()
                )
            }
            (AlertKind::BaselineDeviation, _) => {
                let baseline = ctx.baseline.unwrap_or(t);
                format!(
                    "Temperature {t:.1}°C has drifted {:.1}°C from the session baseline of {baseline:.1}°C.",
                    (t - baseline).abs()
                )
            }
            (AlertKind::Extreme, _) => format!(
                "Temperature {t:.1}°C is CRITICALLY HIGH! Immediate action required to prevent COMPLETE SPOILAGE."
            ),
            (AlertKind::AboveSafeLimit, Condition::TempInRange { min, .. })
            | (AlertKind::AboveSafeLimit, Condition::TempAtLeast(min)) => format!(
                "Temperature {t:.1}°C has crossed {min:.0}°C threshold. High risk of spoilage if not addressed soon."
            ),
            (AlertKind::AboveSafeLimit, _) => format!(
                "Temperature {t:.1}°C is above the safe limit. High risk of spoilage if not addressed soon."
            ),
            (AlertKind::AboveOptimal, _) => format!(
                "Temperature {t:.1}°C is above optimal range. Risk of spoilage increasing."
            ),
            (AlertKind::NearUpperLimit, _) => format!(
                "Temperature {t:.1}°C is approaching upper safe limit. Monitor for spoilage risk."
            ),
        }
    }
}

/// Ordered rule list; priority first, table order breaks ties.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<EscalationRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_config(&EscalationConfig::default())
    }
}

impl RuleTable {
    pub fn new(rules: Vec<EscalationRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(cfg: &EscalationConfig) -> Self {
        let rule = |kind, condition, priority, scope, cooldown_secs| EscalationRule {
            kind,
            condition,
            priority,
            scope,
            cooldown_secs,
        };
        Self::new(vec![
            rule(
                AlertKind::Spike,
                Condition::SpikeAtLeast(cfg.spike_delta),
                Priority::High,
                CooldownScope::TemperatureBucket,
                cfg.cooldown_secs,
            ),
            rule(
                AlertKind::Extreme,
                Condition::TempAtLeast(cfg.extreme_temp),
                Priority::High,
                CooldownScope::TemperatureBucket,
                cfg.cooldown_secs,
            ),
            rule(
                AlertKind::AboveSafeLimit,
                Condition::TempInRange {
                    min: cfg.above_safe_temp,
                    max: cfg.extreme_temp,
                },
                Priority::High,
                CooldownScope::TemperatureBucket,
                cfg.cooldown_secs,
            ),
            rule(
                AlertKind::BaselineDeviation,
                Condition::DeviationAbove(cfg.deviation_limit),
                Priority::Medium,
                CooldownScope::TemperatureBucket,
                cfg.cooldown_secs,
            ),
            rule(
                AlertKind::AboveOptimal,
                Condition::TempInRange {
                    min: cfg.above_optimal_temp,
                    max: cfg.above_safe_temp,
                },
                Priority::Medium,
                CooldownScope::TemperatureBucket,
                cfg.cooldown_secs,
            ),
            rule(
                AlertKind::NearUpperLimit,
                Condition::TempInRange {
                    min: cfg.near_upper_temp,
                    max: cfg.above_optimal_temp,
                },
                Priority::Low,
                CooldownScope::KindWide,
                cfg.watch_cooldown_secs,
            ),
        ])
    }

    pub fn rules(&self) -> &[EscalationRule] {
        &self.rules
    }

    /// Highest-priority rule matching `ctx`, earliest in the table on ties.
    pub fn first_match(&self, ctx: &RuleContext) -> Option<&EscalationRule> {
        let mut best: Option<&EscalationRule> = None;
        for rule in self.rules.iter().filter(|r| r.condition.matches(ctx)) {
            if best.map_or(true, |b| rule.priority > b.priority) {
                best = Some(rule);
            }
        }
        best
    }
}
