//! Container Monitor - per-container domain state and the ingest transition
//!
//! `ingest(reading) -> IngestOutcome` is the single entry point that moves a
//! container forward: classification, trend, rolling history, risk and
//! escalation. The presentation layer only ever reads its outputs.

use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

use crate::config::MonitorConfig;
use crate::engine::{Classifier, EscalationEngine, RiskEstimator};
use crate::pipeline::ingestor::ReadingIngestor;
use crate::types::{AlertEvent, Channel, Reading, RiskAssessment, SensorState, Status};

/// Result of ingesting one new reading.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub state: SensorState,
    pub risk: RiskAssessment,
    pub new_alerts: Vec<AlertEvent>,
}

/// Result of handling one poll.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Backlog readings that only seeded history (initial poll)
    pub seeded: Vec<Reading>,
    /// Readings evaluated by the engine, in order
    pub outcomes: Vec<IngestOutcome>,
}

impl PollOutcome {
    pub fn new_alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.outcomes.iter().flat_map(|o| o.new_alerts.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.seeded.is_empty() && self.outcomes.is_empty()
    }
}

pub struct ContainerMonitor {
    classifier: Classifier,
    estimator: RiskEstimator,
    engine: EscalationEngine,
    ingestor: ReadingIngestor,
    history: VecDeque<f64>,
    history_window: usize,
    state: Option<SensorState>,
    risk: Option<RiskAssessment>,
}

impl ContainerMonitor {
    pub fn new(container_id: impl Into<String>, config: &MonitorConfig) -> Self {
        let history_window = config.risk.history_window.max(1);
        Self {
            classifier: Classifier::new(config.thresholds.clone()),
            estimator: RiskEstimator::new(
                config.thresholds.clone(),
                config.risk.clone(),
                &config.escalation,
            ),
            engine: EscalationEngine::new(container_id, &config.escalation),
            ingestor: ReadingIngestor::new(),
            history: VecDeque::with_capacity(history_window),
            history_window,
            state: None,
            risk: None,
        }
    }

    pub fn container_id(&self) -> &str {
        self.engine.container_id()
    }

    pub fn state(&self) -> Option<&SensorState> {
        self.state.as_ref()
    }

    pub fn risk(&self) -> Option<&RiskAssessment> {
        self.risk.as_ref()
    }

    pub fn baseline(&self) -> Option<f64> {
        self.engine.baseline()
    }

    /// Status band for a temperature under this container's thresholds.
    pub fn classify(&self, temperature: f64) -> Status {
        self.classifier.classify(temperature)
    }

    /// Rolling temperature window, oldest first.
    pub fn history(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }

    /// Alert log, newest first.
    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.engine.alerts().cloned().collect()
    }

    pub fn suppressed_alerts(&self) -> u64 {
        self.engine.suppressed_count()
    }

    pub fn mark_delivered(&mut self, alert_id: &str, channels: &BTreeSet<Channel>) -> bool {
        self.engine.mark_delivered(alert_id, channels)
    }

    /// Handle one polled window.
    ///
    /// On the initial backlog only the newest reading is evaluated; the
    /// older ones seed the rolling window, the baseline and the previous
    /// temperature.
    pub fn process_poll(&mut self, batch: Vec<Reading>) -> PollOutcome {
        let fresh = self.ingestor.accept(batch);
        let mut readings = fresh.readings;
        let mut outcome = PollOutcome::default();

        if fresh.initial && readings.len() > 1 {
            let newest = readings.split_off(readings.len() - 1);
            for reading in &readings {
                self.seed(reading);
            }
            outcome.seeded = readings;
            readings = newest;
        }

        outcome.outcomes = readings
            .into_iter()
            .filter_map(|reading| self.ingest(reading))
            .collect();
        outcome
    }

    /// Move the container state forward without evaluating escalation.
    pub fn seed(&mut self, reading: &Reading) {
        if !self.is_new(reading) {
            return;
        }
        let previous = self.state.as_ref().map(|s| s.current_temperature);
        self.engine.observe_baseline(reading.temperature);
        self.push_history(reading.temperature);
        self.state = Some(self.next_state(reading, previous));
    }

    /// Ingest one reading. Returns `None` for readings at or before the
    /// last-seen timestamp, which leave every piece of state untouched.
    pub fn ingest(&mut self, reading: Reading) -> Option<IngestOutcome> {
        if !self.is_new(&reading) {
            debug!(
                container = %self.container_id(),
                timestamp = reading.timestamp,
                "[Monitor] Ignoring stale reading"
            );
            return None;
        }

        let previous = self.state.as_ref().map(|s| s.current_temperature);
        let state = self.next_state(&reading, previous);
        self.push_history(reading.temperature);

        let history = self.history();
        let risk = self
            .estimator
            .estimate_risk(reading.temperature, state.trend, &history);
        let new_alerts: Vec<AlertEvent> = self
            .engine
            .evaluate(&reading, previous, &risk.spoilage)
            .into_iter()
            .collect();

        self.state = Some(state.clone());
        self.risk = Some(risk.clone());

        Some(IngestOutcome {
            reading,
            state,
            risk,
            new_alerts,
        })
    }

    fn is_new(&self, reading: &Reading) -> bool {
        self.state
            .as_ref()
            .map_or(true, |s| reading.timestamp > s.last_seen_timestamp)
    }

    fn next_state(&self, reading: &Reading, previous: Option<f64>) -> SensorState {
        SensorState {
            current_temperature: reading.temperature,
            status: self.classifier.classify(reading.temperature),
            trend: self.classifier.trend(reading.temperature, previous),
            last_seen_timestamp: reading.timestamp,
        }
    }

    fn push_history(&mut self, temperature: f64) {
        if self.history.len() >= self.history_window {
            self.history.pop_front();
        }
        self.history.push_back(temperature);
    }
}
