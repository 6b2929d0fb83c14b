//! Escalation Scenario Tests
//!
//! End-to-end behaviour of the evaluation engine through the public API:
//! band classification, trend, rule precedence, cooldown suppression,
//! replay safety, the bounded alert log and spoilage projection.

use coldchain_monitor::config::{BaselineMode, EscalationConfig, MonitorConfig};
use coldchain_monitor::engine::{classify, estimate_spoilage, trend, EscalationEngine};
use coldchain_monitor::pipeline::ContainerMonitor;
use coldchain_monitor::types::{AlertKind, Priority, Reading, SpoilageRisk, Status, Trend};

fn reading(ts: u64, temp: f64) -> Reading {
    Reading::new(format!("r{ts}"), ts, temp)
}

fn config_with_baseline(mode: BaselineMode, baseline: Option<f64>) -> MonitorConfig {
    let mut cfg = MonitorConfig::default();
    cfg.escalation.baseline_mode = mode;
    cfg.escalation.baseline_temp = baseline;
    cfg
}

fn fixed_baseline_engine(baseline: f64) -> EscalationEngine {
    let cfg = EscalationConfig {
        baseline_mode: BaselineMode::Fixed,
        baseline_temp: Some(baseline),
        ..EscalationConfig::default()
    };
    EscalationEngine::new("C1", &cfg)
}

// ============================================================================
// Classification and trend
// ============================================================================

#[test]
fn classify_covers_every_band() {
    let mut t = 2.0;
    while t <= 8.0 {
        assert_eq!(classify(t), Status::Safe, "{t}");
        t += 0.25;
    }
    for t in [8.01, 9.0, 10.0, 0.0, 1.0, 1.99] {
        assert_eq!(classify(t), Status::Warning, "{t}");
    }
    for t in [10.01, 15.0, 40.0, -0.01, -20.0, f64::NAN] {
        assert_eq!(classify(t), Status::Critical, "{t}");
    }
}

#[test]
fn trend_of_equal_temperatures_is_steady() {
    for t in [-10.0, 0.0, 4.2, 8.0, 14.5, 30.0] {
        assert_eq!(trend(t, Some(t)), Trend::Steady);
    }
    assert_eq!(trend(5.0, None), Trend::Steady);
}

// ============================================================================
// Rule precedence and cooldown
// ============================================================================

#[test]
fn deviation_fires_once_within_cooldown_window() {
    let mut engine = fixed_baseline_engine(3.0);
    let spoilage = estimate_spoilage(&[], 6);

    let first = engine
        .evaluate(&reading(160, 9.0), Some(8.5), &spoilage)
        .expect("deviation alert");
    assert_eq!(first.kind, AlertKind::BaselineDeviation);
    assert_eq!(first.priority, Priority::Medium);

    for ts in [220, 280, 400, 459] {
        assert!(
            engine.evaluate(&reading(ts, 9.0), Some(9.0), &spoilage).is_none(),
            "repeat at t={ts} should be suppressed"
        );
    }
    assert_eq!(engine.suppressed_count(), 4);
    assert_eq!(engine.alert_count(), 1);

    // 300 s after the first alert the bucket is open again
    let again = engine.evaluate(&reading(460, 9.0), Some(9.0), &spoilage);
    assert_eq!(again.map(|a| a.kind), Some(AlertKind::BaselineDeviation));
}

#[test]
fn spike_takes_precedence_over_deviation() {
    let mut engine = fixed_baseline_engine(5.0);
    let spoilage = estimate_spoilage(&[], 6);

    let alert = engine
        .evaluate(&reading(100, 11.0), Some(5.0), &spoilage)
        .expect("spike alert");
    assert_eq!(alert.kind, AlertKind::Spike);
    assert_eq!(alert.priority, Priority::High);
    assert_eq!(alert.previous_temperature, Some(5.0));
    assert_eq!(engine.alert_count(), 1);
}

#[test]
fn different_kinds_do_not_share_cooldown() {
    let mut engine = fixed_baseline_engine(5.0);
    let spoilage = estimate_spoilage(&[], 6);

    let spike = engine.evaluate(&reading(100, 11.0), Some(5.0), &spoilage);
    let band = engine.evaluate(&reading(110, 11.0), Some(10.8), &spoilage);
    assert_eq!(spike.map(|a| a.kind), Some(AlertKind::Spike));
    assert_eq!(band.map(|a| a.kind), Some(AlertKind::AboveSafeLimit));
}

#[test]
fn default_session_escalates_high_bands_to_high_priority() {
    let cfg = MonitorConfig::default();
    let mut monitor = ContainerMonitor::new("C1", &cfg);

    let outcomes: Vec<_> = [(100, 5.0), (200, 8.0), (300, 12.0), (400, 16.0)]
        .into_iter()
        .map(|(ts, temp)| monitor.ingest(reading(ts, temp)).expect("fresh reading"))
        .collect();

    assert_eq!(monitor.baseline(), Some(5.0));
    let at_12 = &outcomes[2].new_alerts;
    assert_eq!(at_12.len(), 1);
    assert_eq!(at_12[0].kind, AlertKind::AboveSafeLimit);
    assert_eq!(at_12[0].priority, Priority::High);

    let at_16 = &outcomes[3].new_alerts;
    assert_eq!(at_16.len(), 1);
    assert_eq!(at_16[0].kind, AlertKind::Extreme);
    assert_eq!(at_16[0].priority, Priority::High);
}

// ============================================================================
// Replay safety and log bound
// ============================================================================

#[test]
fn stale_reading_changes_nothing() {
    let cfg = MonitorConfig::default();
    let mut monitor = ContainerMonitor::new("C1", &cfg);

    monitor.ingest(reading(100, 5.0)).expect("first reading");
    monitor.ingest(reading(200, 9.0)).expect("second reading");
    let state_before = monitor.state().cloned();
    let history_before = monitor.history();
    let alerts_before = monitor.alerts();

    assert!(monitor.ingest(reading(200, 16.0)).is_none());
    assert!(monitor.ingest(reading(150, 16.0)).is_none());

    assert_eq!(monitor.state().cloned(), state_before);
    assert_eq!(monitor.history(), history_before);
    assert_eq!(monitor.alerts(), alerts_before);
}

#[test]
fn alert_log_keeps_newest_ten() {
    let mut engine = EscalationEngine::new("C1", &EscalationConfig::default());
    let spoilage = estimate_spoilage(&[], 6);

    for i in 0..15u64 {
        let temp = 20.0 + i as f64;
        let alert = engine.evaluate(&reading(100 + i, temp), Some(temp - 6.0), &spoilage);
        assert!(alert.is_some(), "alert {i} should fire");
    }

    let log: Vec<f64> = engine.alerts().map(|a| a.temperature).collect();
    assert_eq!(log.len(), 10);
    assert_eq!(log.first(), Some(&34.0));
    assert_eq!(log.last(), Some(&25.0));
}

// ============================================================================
// Spoilage
// ============================================================================

#[test]
fn spoilage_high_for_sustained_nine_degrees() {
    let assessment = estimate_spoilage(&[9.0; 6], 6);
    assert_eq!(assessment.risk, SpoilageRisk::High);
    let hours = assessment.hours_to_spoilage.expect("hours to spoilage");
    assert!(hours > 0);
}

#[test]
fn spoilage_needs_full_window() {
    for history in [vec![], vec![20.0; 5], vec![9.0, 9.0, 9.0]] {
        let assessment = estimate_spoilage(&history, 6);
        assert_eq!(assessment.risk, SpoilageRisk::Low);
        assert!(assessment.is_insufficient());
        assert!(assessment.message.to_lowercase().contains("insufficient data"));
    }
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn safe_warning_critical_sequence() {
    let cfg = config_with_baseline(BaselineMode::Disabled, None);
    let mut monitor = ContainerMonitor::new("C1", &cfg);

    let first = monitor.ingest(reading(100, 5.0)).unwrap();
    let second = monitor.ingest(reading(200, 9.2)).unwrap();
    let third = monitor.ingest(reading(260, 14.5)).unwrap();

    assert_eq!(
        [first.state.status, second.state.status, third.state.status],
        [Status::Safe, Status::Warning, Status::Critical]
    );

    assert!(first.new_alerts.is_empty());

    assert_eq!(second.new_alerts.len(), 1);
    assert_eq!(second.new_alerts[0].priority, Priority::Medium);
    assert_eq!(second.new_alerts[0].kind, AlertKind::AboveOptimal);

    assert_eq!(third.new_alerts.len(), 1);
    assert_eq!(third.new_alerts[0].priority, Priority::High);
    assert_eq!(third.new_alerts[0].kind, AlertKind::Spike);

    assert_eq!(third.state.trend, Trend::Up);
    assert_eq!(monitor.baseline(), None);
    let kinds: Vec<AlertKind> = monitor.alerts().iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::Spike, AlertKind::AboveOptimal]);
}

#[test]
fn initial_backlog_only_evaluates_newest() {
    let cfg = MonitorConfig::default();
    let mut monitor = ContainerMonitor::new("C1", &cfg);

    // Older readings would each fire alerts if they were evaluated.
    let backlog = vec![
        reading(100, 4.0),
        reading(160, 12.0),
        reading(220, 4.5),
        reading(280, 5.0),
    ];
    let outcome = monitor.process_poll(backlog);

    assert_eq!(outcome.seeded.len(), 3);
    assert_eq!(outcome.outcomes.len(), 1);
    assert_eq!(outcome.new_alerts().count(), 0);
    assert_eq!(monitor.baseline(), Some(4.0));
    assert_eq!(monitor.history().len(), 4);
    assert_eq!(monitor.state().map(|s| s.last_seen_timestamp), Some(280));

    // Later polls evaluate every new reading in order.
    let next = monitor.process_poll(vec![
        reading(220, 4.5),
        reading(280, 5.0),
        reading(340, 8.7),
        reading(400, 10.6),
    ]);
    assert!(next.seeded.is_empty());
    assert_eq!(next.outcomes.len(), 2);
    let kinds: Vec<AlertKind> = next.new_alerts().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::AboveOptimal, AlertKind::AboveSafeLimit]);
    let priorities: Vec<Priority> = next.new_alerts().map(|a| a.priority).collect();
    assert_eq!(priorities, vec![Priority::Medium, Priority::High]);
}
