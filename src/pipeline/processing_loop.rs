//! Timer-driven polling loop shared by every input mode.
//!
//! One [`ProcessingLoop`] owns the reading source, the container monitor and
//! the dispatcher. Timer ticks and manual refresh requests are serialized
//! through the same `select!`, so no two polls ever overlap.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::monitor::{ContainerMonitor, PollOutcome};
use super::source::ReadingSource;
use super::state::{AppState, ChartPoint, DispatchWarning};
use crate::acquisition::IngestError;
use crate::notify::{Dispatcher, Toast, ToastFeed};
use crate::types::{AlertEvent, Priority};

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: u64,
    pub polls_failed: u64,
    pub readings_processed: u64,
    pub alerts_fired: u64,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Built with [`new()`](ProcessingLoop::new), optionally given a refresh
/// trigger with [`with_refresh()`](ProcessingLoop::with_refresh), then
/// consumed by [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop<S: ReadingSource> {
    source: S,
    monitor: ContainerMonitor,
    dispatcher: Dispatcher,
    app_state: Arc<RwLock<AppState>>,
    toasts: ToastFeed,
    refresh: Arc<Notify>,
    cancel_token: CancellationToken,
    poll_interval: Duration,
    stats: LoopStats,
}

impl<S: ReadingSource> ProcessingLoop<S> {
    pub fn new(
        source: S,
        monitor: ContainerMonitor,
        dispatcher: Dispatcher,
        app_state: Arc<RwLock<AppState>>,
        toasts: ToastFeed,
        cancel_token: CancellationToken,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            monitor,
            dispatcher,
            app_state,
            toasts,
            refresh: Arc::new(Notify::new()),
            cancel_token,
            poll_interval,
            stats: LoopStats::default(),
        }
    }

    /// Share a refresh trigger with the dashboard API.
    pub fn with_refresh(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn monitor(&self) -> &ContainerMonitor {
        &self.monitor
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Poll on every tick or refresh request until cancelled.
    pub async fn run(mut self) -> LoopStats {
        info!(
            "📡 Polling {} every {}s for container {}",
            self.source.source_name(),
            self.poll_interval.as_secs(),
            self.monitor.container_id()
        );

        let mut interval = tokio::time::interval(self.poll_interval.max(Duration::from_millis(100)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("[Poller] Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
                _ = self.refresh.notified() => {
                    debug!("[Poller] Manual refresh requested");
                    interval.reset();
                }
            }

            if let Err(e) = self.poll_once().await {
                warn!(source = %self.source.source_name(), error = %e, "[Poller] Poll failed");
            }
        }

        info!(
            polls = self.stats.polls,
            failed = self.stats.polls_failed,
            readings = self.stats.readings_processed,
            alerts = self.stats.alerts_fired,
            "[Poller] Stopped"
        );
        self.stats
    }

    /// One ingestion tick: fetch, evaluate, publish, dispatch.
    ///
    /// Source errors are recorded on the connectivity state and returned;
    /// the monitor state is left untouched.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, IngestError> {
        self.stats.polls += 1;
        let batch = match self.source.poll().await {
            Ok(batch) => batch,
            Err(e) => {
                self.stats.polls_failed += 1;
                self.app_state.write().await.record_poll_failure(e.to_string());
                return Err(e);
            }
        };

        let outcome = self.monitor.process_poll(batch);
        self.stats.readings_processed += outcome.outcomes.len() as u64;
        self.publish(&outcome).await;

        let alerts: Vec<AlertEvent> = outcome.new_alerts().cloned().collect();
        for alert in &alerts {
            self.stats.alerts_fired += 1;
            log_alert(alert);
            self.dispatch(alert).await;
        }
        if !alerts.is_empty() {
            self.app_state.write().await.alerts = self.monitor.alerts();
        }

        Ok(outcome)
    }

    /// Copy the monitor's outputs into the shared dashboard state.
    async fn publish(&self, outcome: &PollOutcome) {
        let mut state = self.app_state.write().await;
        state.record_poll_success(chrono::Utc::now());

        for reading in &outcome.seeded {
            state.push_chart(ChartPoint::new(reading, self.monitor.classify(reading.temperature)));
        }
        for o in &outcome.outcomes {
            state.push_chart(ChartPoint::new(&o.reading, o.state.status));
        }
        if outcome.is_empty() {
            return;
        }

        state.readings_processed += outcome.outcomes.len() as u64;
        state.sensor = self.monitor.state().cloned();
        state.risk = self.monitor.risk().cloned();
        state.baseline = self.monitor.baseline();
        state.alerts = self.monitor.alerts();
        state.alerts_suppressed = self.monitor.suppressed_alerts();
        state.alerts_fired += outcome.new_alerts().count() as u64;
        state.refresh_status();
    }

    /// Awaited dispatch; failures become dashboard warnings and toasts.
    async fn dispatch(&mut self, alert: &AlertEvent) {
        let report = self.dispatcher.dispatch(alert).await;
        self.monitor.mark_delivered(&alert.id, &report.delivered);

        for (channel, error) in &report.failed {
            self.toasts
                .push(Toast::delivery_failure(&alert.id, *channel, error))
                .await;
            self.app_state
                .write()
                .await
                .record_dispatch_failure(DispatchWarning {
                    alert_id: alert.id.clone(),
                    channel: *channel,
                    error: error.to_string(),
                    at: chrono::Utc::now(),
                });
        }
        if let Some(toast) = Toast::delivery_summary(&report) {
            self.toasts.push(toast).await;
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn log_alert(alert: &AlertEvent) {
    match alert.priority {
        Priority::High => warn!(
            container = %alert.container_id,
            kind = alert.kind.short_code(),
            temp = alert.temperature,
            "🚨 ALERT [{}] {}",
            alert.priority,
            alert.subject
        ),
        Priority::Medium | Priority::Low => info!(
            container = %alert.container_id,
            kind = alert.kind.short_code(),
            temp = alert.temperature,
            "⚠️  ALERT [{}] {}",
            alert.priority,
            alert.subject
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaselineMode, MonitorConfig};
    use crate::notify::{ChannelSender, DispatchError, InAppSender};
    use crate::pipeline::source::ScriptedSource;
    use crate::pipeline::SystemStatus;
    use crate::types::{Channel, Reading};
    use async_trait::async_trait;

    struct FailingEmail;

    #[async_trait]
    impl ChannelSender for FailingEmail {
        fn channel(&self) -> Channel {
            Channel::Email
        }

        async fn send(&self, _alert: &AlertEvent) -> Result<(), DispatchError> {
            Err(DispatchError::Rejected {
                status: 500,
                message: "smtp down".to_string(),
            })
        }
    }

    fn build(script: Vec<Result<Vec<Reading>, IngestError>>) -> (ProcessingLoop<ScriptedSource>, Arc<RwLock<AppState>>, ToastFeed) {
        let mut config = MonitorConfig::default();
        config.escalation.baseline_mode = BaselineMode::Disabled;
        let state = Arc::new(RwLock::new(AppState::new("TS-1", 100)));
        let toasts = ToastFeed::new(50);
        let dispatcher = Dispatcher::new(Duration::from_secs(1))
            .with_sender(Arc::new(InAppSender::new(toasts.clone())))
            .with_sender(Arc::new(FailingEmail));
        let pl = ProcessingLoop::new(
            ScriptedSource::new(script),
            ContainerMonitor::new("TS-1", &config),
            dispatcher,
            Arc::clone(&state),
            toasts.clone(),
            CancellationToken::new(),
            Duration::from_secs(5),
        );
        (pl, state, toasts)
    }

    #[tokio::test]
    async fn source_error_flips_connectivity_and_keeps_state() {
        let (mut pl, state, _) = build(vec![
            Ok(vec![Reading::new("a", 100, 5.0)]),
            Err(IngestError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)),
        ]);
        pl.poll_once().await.unwrap();
        assert!(pl.poll_once().await.is_err());

        let s = state.read().await;
        assert!(!s.connectivity.connected);
        assert_eq!(s.status, SystemStatus::Disconnected);
        assert_eq!(s.sensor.as_ref().unwrap().current_temperature, 5.0);
        assert_eq!(pl.stats().polls_failed, 1);
    }

    #[tokio::test]
    async fn failed_channel_becomes_warning_and_toast() {
        let (mut pl, state, toasts) = build(vec![
            Ok(vec![Reading::new("a", 100, 5.0)]),
            Ok(vec![Reading::new("a", 100, 5.0), Reading::new("b", 200, 9.2)]),
        ]);
        pl.poll_once().await.unwrap();
        let outcome = pl.poll_once().await.unwrap();
        assert_eq!(outcome.new_alerts().count(), 1);

        let s = state.read().await;
        assert_eq!(s.dispatch_warnings.len(), 1);
        assert_eq!(s.dispatch_warnings[0].channel, Channel::Email);
        assert_eq!(s.alerts.len(), 1);
        assert!(s.alerts[0].channels_sent.contains(&Channel::InApp));
        assert!(!s.alerts[0].channels_sent.contains(&Channel::Email));

        let titles: Vec<String> = toasts.snapshot().await.into_iter().map(|t| t.title).collect();
        assert!(titles.iter().any(|t| t == "Failed to send email alert"));
    }

    #[tokio::test]
    async fn empty_poll_is_no_data_not_error() {
        let (mut pl, state, _) = build(vec![Ok(Vec::new())]);
        let outcome = pl.poll_once().await.unwrap();
        assert!(outcome.is_empty());
        let s = state.read().await;
        assert!(s.connectivity.connected);
        assert_eq!(s.status, SystemStatus::Initializing);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (pl, _, _) = build(vec![Ok(vec![Reading::new("a", 100, 5.0)])]);
        let token = pl.cancel_token.clone();
        let handle = tokio::spawn(pl.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        let stats = handle.await.unwrap();
        assert!(stats.polls >= 1);
    }
}
