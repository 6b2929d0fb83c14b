//! Alert cooldown table
//!
//! Keys are structured `(kind, priority, temperature bucket)` tuples so two
//! unrelated rules can never collide on a bucket. Time is the reading
//! timestamp, which keeps replays deterministic.

use crate::engine::rules::{CooldownScope, EscalationRule};
use crate::types::{AlertKind, Priority};
use std::collections::HashMap;

/// Dedup bucket for a fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub kind: AlertKind,
    pub priority: Priority,
    /// Half-degree bucket index (`floor(t * 2)`); `None` for kind-wide rules
    pub bucket: Option<i64>,
}

impl CooldownKey {
    pub fn for_rule(rule: &EscalationRule, temperature: f64) -> Self {
        let bucket = match rule.scope {
            CooldownScope::TemperatureBucket => Some(half_degree_bucket(temperature)),
            CooldownScope::KindWide => None,
        };
        Self {
            kind: rule.kind,
            priority: rule.priority,
            bucket,
        }
    }
}

fn half_degree_bucket(temperature: f64) -> i64 {
    // Saturating float-to-int cast; NaN lands in bucket 0
    (temperature * 2.0).floor() as i64
}

/// Last-fired timestamps per bucket.
#[derive(Debug, Default)]
pub struct CooldownTable {
    last_fired: HashMap<CooldownKey, u64>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while `key` fired less than `ttl_secs` before `now`.
    pub fn is_suppressed(&self, key: &CooldownKey, now: u64, ttl_secs: u64) -> bool {
        match self.last_fired.get(key) {
            None => false,
            Some(&fired_at) => now.saturating_sub(fired_at) < ttl_secs,
        }
    }

    pub fn record(&mut self, key: CooldownKey, now: u64) {
        self.last_fired.insert(key, now);
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kind: AlertKind, priority: Priority, bucket: Option<i64>) -> CooldownKey {
        CooldownKey {
            kind,
            priority,
            bucket,
        }
    }

    #[test]
    fn allows_first_fire() {
        let table = CooldownTable::new();
        assert!(!table.is_suppressed(&key(AlertKind::Extreme, Priority::High, Some(32)), 100, 300));
    }

    #[test]
    fn suppresses_within_ttl() {
        let mut table = CooldownTable::new();
        let k = key(AlertKind::Extreme, Priority::High, Some(32));
        table.record(k, 100);
        assert!(table.is_suppressed(&k, 100, 300));
        assert!(table.is_suppressed(&k, 399, 300));
        assert!(!table.is_suppressed(&k, 400, 300));
    }

    #[test]
    fn different_kind_same_bucket_not_suppressed() {
        let mut table = CooldownTable::new();
        table.record(key(AlertKind::Spike, Priority::High, Some(22)), 100);
        assert!(!table.is_suppressed(&key(AlertKind::AboveSafeLimit, Priority::High, Some(22)), 120, 300));
    }

    #[test]
    fn half_degree_buckets() {
        assert_eq!(half_degree_bucket(11.0), 22);
        assert_eq!(half_degree_bucket(11.49), 22);
        assert_eq!(half_degree_bucket(11.5), 23);
        assert_eq!(half_degree_bucket(-0.2), -1);
    }
}
