//! Cold-Chain Excursion Simulation
//!
//! Replays a recorded CSV or a synthetic temperature profile through the full
//! monitoring pipeline (classifier, risk estimator, escalation, dispatcher)
//! with log-only email/SMS channels, then prints a summary.
//!
//! The synthetic profile walks through:
//! - Stable storage inside the safe band
//! - Slow drift toward the upper limit (watch alerts)
//! - Door-open spike (spike alert)
//! - Cooling failure (above-safe and extreme alerts)
//! - Recovery back into the safe band
//!
//! # Usage
//! ```bash
//! ./simulation --hours 6 --seed 42
//! ./simulation --csv readings.csv
//! ./simulation --hours 6 --emit-csv > readings.csv && ./coldchain-monitor --replay readings.csv
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use coldchain_monitor::acquisition::{read_csv_readings, CsvReplaySource};
use coldchain_monitor::config::MonitorConfig;
use coldchain_monitor::notify::{
    ChannelSender, DispatchError, Dispatcher, InAppSender, MessageComposer, ToastFeed,
};
use coldchain_monitor::pipeline::{AppState, ContainerMonitor, ProcessingLoop};
use coldchain_monitor::types::{AlertEvent, Channel, Priority, Reading, Status};

// ============================================================================
// Profile Constants
// ============================================================================

/// Storage setpoint (°C)
const SETPOINT: f64 = 4.5;
/// Temperature reached by the end of the drift phase (°C)
const DRIFT_PEAK: f64 = 8.0;
/// Temperature right after the door opens (°C)
const DOOR_OPEN_TEMP: f64 = 13.5;
/// Peak temperature during the cooling failure (°C)
const FAILURE_PEAK: f64 = 16.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "coldchain-simulation")]
#[command(about = "Cold-chain excursion simulation through the monitoring pipeline")]
#[command(version = "1.0")]
struct Args {
    /// Replay a recorded CSV (id,timestamp,temperature) instead of the synthetic profile
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Synthetic profile duration in hours (1-72)
    #[arg(short = 'H', long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=72))]
    hours: u32,

    /// Seconds between synthetic readings
    #[arg(long, default_value = "120")]
    interval: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Readings revealed per poll
    #[arg(long, default_value = "1")]
    step: usize,

    /// Container identifier
    #[arg(long, default_value = "SIM-001")]
    container: String,

    /// Optional coldchain.toml for thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the synthetic profile as CSV to stdout and exit
    #[arg(long)]
    emit_csv: bool,
}

// ============================================================================
// Synthetic Profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Stable storage (0-40%)
    Stable,
    /// Slow drift toward the upper limit (40-55%)
    Drift,
    /// Door left open (55-62%)
    DoorOpen,
    /// Cooling unit failure (62-75%)
    CoolingFailure,
    /// Return to setpoint (75-100%)
    Recovery,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Stable => "Stable Storage",
            Phase::Drift => "Drift Toward Upper Limit",
            Phase::DoorOpen => "Door Open",
            Phase::CoolingFailure => "Cooling Failure",
            Phase::Recovery => "Recovery",
        }
    }

    fn from_progress(progress: f64) -> Self {
        match progress {
            p if p < 0.40 => Phase::Stable,
            p if p < 0.55 => Phase::Drift,
            p if p < 0.62 => Phase::DoorOpen,
            p if p < 0.75 => Phase::CoolingFailure,
            _ => Phase::Recovery,
        }
    }

    /// Noise-free temperature at `progress` through the run.
    fn target(&self, progress: f64) -> f64 {
        let lerp = |from: f64, to: f64, start: f64, end: f64| {
            from + (to - from) * ((progress - start) / (end - start)).clamp(0.0, 1.0)
        };
        match self {
            Phase::Stable => SETPOINT,
            Phase::Drift => lerp(SETPOINT, DRIFT_PEAK, 0.40, 0.55),
            Phase::DoorOpen => DOOR_OPEN_TEMP,
            Phase::CoolingFailure => lerp(DOOR_OPEN_TEMP, FAILURE_PEAK, 0.62, 0.70),
            Phase::Recovery => {
                let t = ((progress - 0.75) / 0.25).clamp(0.0, 1.0);
                SETPOINT + (FAILURE_PEAK - SETPOINT) * (-6.0 * t).exp()
            }
        }
    }
}

fn synthetic_profile(args: &Args) -> Result<Vec<Reading>> {
    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let noise = Normal::new(0.0, 0.15).context("Invalid noise distribution")?;

    let interval = args.interval.max(1);
    let total = u64::from(args.hours) * 3600 / interval;
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    let start = now.saturating_sub(total * interval);

    let mut last_phase = None;
    let readings = (0..total)
        .map(|i| {
            let progress = i as f64 / total as f64;
            let phase = Phase::from_progress(progress);
            if last_phase != Some(phase) {
                info!(reading = i, "[Simulation] >>> PHASE: {}", phase.name());
                last_phase = Some(phase);
            }
            let temperature = phase.target(progress) + noise.sample(&mut rng);
            Reading::new(
                format!("sim-{i:05}"),
                start + i * interval,
                (temperature * 100.0).round() / 100.0,
            )
        })
        .collect();
    Ok(readings)
}

// ============================================================================
// Log-Only Channels
// ============================================================================

/// Stands in for the relay: logs the composed message instead of sending it.
struct LogSender {
    channel: Channel,
    composer: MessageComposer,
}

#[async_trait]
impl ChannelSender for LogSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, alert: &AlertEvent) -> Result<(), DispatchError> {
        match self.channel {
            Channel::Sms => info!("[{}] {}", self.channel, self.composer.sms_body(alert)),
            _ => info!("[{}] {}", self.channel, self.composer.email_subject(alert)),
        }
        Ok(())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let readings = match args.csv {
        Some(ref path) => read_csv_readings(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => synthetic_profile(&args)?,
    };

    if args.emit_csv {
        println!("id,timestamp,temperature");
        for r in &readings {
            println!("{},{},{:.2}", r.id, r.timestamp, r.temperature);
        }
        return Ok(());
    }

    let mut cfg = match args.config {
        Some(ref path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    cfg.container.id = args.container.clone();

    info!("{}", "=".repeat(70));
    info!("COLD-CHAIN EXCURSION SIMULATION");
    info!("{}", "=".repeat(70));
    info!("  Container: {}", cfg.container.id);
    info!("  Readings: {}", readings.len());
    info!(
        "  Safe band: {:.1}-{:.1}°C | Warning band: {:.1}-{:.1}°C",
        cfg.thresholds.safe_min, cfg.thresholds.safe_max, cfg.thresholds.warning_low, cfg.thresholds.warning_high
    );
    info!("{}", "=".repeat(70));

    let toasts = ToastFeed::new(cfg.notify.toast_capacity);
    let composer = MessageComposer::new(cfg.notify.signature.clone(), cfg.container.id.clone());
    let dispatcher = Dispatcher::new(Duration::from_secs(cfg.notify.dispatch_timeout_secs))
        .with_sender(Arc::new(InAppSender::new(toasts.clone())))
        .with_sender(Arc::new(LogSender { channel: Channel::Email, composer: composer.clone() }))
        .with_sender(Arc::new(LogSender { channel: Channel::Sms, composer }));

    let app_state = Arc::new(RwLock::new(AppState::new(
        cfg.container.id.clone(),
        cfg.source.chart_capacity,
    )));
    let source = CsvReplaySource::new(readings, args.step, cfg.source.fetch_limit);
    let monitor = ContainerMonitor::new(cfg.container.id.clone(), &cfg);
    let mut processing_loop = ProcessingLoop::new(
        source,
        monitor,
        dispatcher,
        Arc::clone(&app_state),
        toasts.clone(),
        CancellationToken::new(),
        Duration::ZERO,
    );

    let start_time = Instant::now();
    let mut statuses: HashMap<Status, u64> = HashMap::new();
    let mut alerts_by_priority: BTreeMap<Priority, u64> = BTreeMap::new();
    let mut peak: Option<f64> = None;

    while !processing_loop.source().is_exhausted() {
        let outcome = processing_loop.poll_once().await?;
        for o in &outcome.outcomes {
            *statuses.entry(o.state.status).or_default() += 1;
            peak = Some(peak.map_or(o.reading.temperature, |p| p.max(o.reading.temperature)));
            for alert in &o.new_alerts {
                *alerts_by_priority.entry(alert.priority).or_default() += 1;
            }
        }
    }

    let stats = processing_loop.stats();
    let state = app_state.read().await;

    info!("{}", "=".repeat(70));
    info!("SIMULATION COMPLETE");
    info!("{}", "=".repeat(70));
    info!("Readings evaluated: {}", stats.readings_processed);
    for status in [Status::Safe, Status::Warning, Status::Critical] {
        info!("  {:<9} {}", status.to_string(), statuses.get(&status).copied().unwrap_or(0));
    }
    if let Some(peak) = peak {
        info!("Peak temperature: {:.2}°C", peak);
    }
    info!("Alerts fired: {} (suppressed by cooldown: {})", stats.alerts_fired, state.alerts_suppressed);
    for (priority, count) in &alerts_by_priority {
        info!("  {:<7} {}", priority.to_string(), count);
    }
    if let Some(ref risk) = state.risk {
        info!("Final risk: {} ({})", risk.risk_level, risk.recommendation);
    }
    info!("Toasts queued: {}", toasts.len().await);
    info!("Real time: {:.2}s", start_time.elapsed().as_secs_f64());
    info!("{}", "=".repeat(70));

    Ok(())
}
