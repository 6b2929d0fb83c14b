//! Temperature Evaluation Engine
//!
//! Deterministic rules that turn a reading stream into status, risk and
//! deduplicated alerts. Nothing here performs I/O.
//!
//! - `classifier` - status band and trend
//! - `risk` - risk table and spoilage projection
//! - `rules` - ordered escalation rule table
//! - `cooldown` - structured cooldown buckets with TTL
//! - `escalation` - baseline, rule evaluation and the bounded alert log

pub mod classifier;
pub mod cooldown;
pub mod escalation;
pub mod risk;
pub mod rules;

pub use classifier::{classify, trend, Classifier};
pub use cooldown::{CooldownKey, CooldownTable};
pub use escalation::EscalationEngine;
pub use risk::{estimate_spoilage, waiting_assessment, RiskEstimator};
pub use rules::{Condition, CooldownScope, EscalationRule, RuleContext, RuleTable};
