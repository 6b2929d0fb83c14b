//! ColdChain Monitor - container temperature evaluation and alert escalation
//!
//! Polls a container's reading log, classifies every new reading, escalates
//! excursions to in-app, email and SMS channels, and serves the dashboard API.
//!
//! # Usage
//!
//! ```bash
//! # Poll the realtime database configured in coldchain.toml / COLDCHAIN_DB_URL
//! cargo run --release
//!
//! # Replay a recorded CSV (id,timestamp,temperature) through the live pipeline
//! cargo run --release -- --replay readings.csv --poll-interval 1
//! ```
//!
//! # Environment Variables
//!
//! - `COLDCHAIN_CONFIG`: Path to a `coldchain.toml`
//! - `COLDCHAIN_DB_URL` / `COLDCHAIN_DB_AUTH`: Realtime database URL and auth token
//! - `COLDCHAIN_RELAY_URL`: Notification relay base URL
//! - `ALERT_EMAIL_TO` / `ALERT_SMS_TO`: Alert recipients
//! - `COLDCHAIN_SERVER_ADDR`: Dashboard listen address (default: 0.0.0.0:8080)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use axum::Router;
use coldchain_monitor::acquisition::{read_csv_readings, CsvReplaySource, RtdbSource};
use coldchain_monitor::api::{create_app, DashboardState};
use coldchain_monitor::config::{self, MonitorConfig};
use coldchain_monitor::notify::{Dispatcher, RelayClient, ToastFeed};
use coldchain_monitor::pipeline::{AppState, ContainerMonitor, ProcessingLoop, ReadingSource};
use coldchain_monitor::store::{AdminService, RealtimeDbClient};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "coldchain-monitor")]
#[command(about = "Cold-chain container temperature monitoring and alert escalation")]
#[command(version)]
struct CliArgs {
    /// Path to a coldchain.toml (overrides the COLDCHAIN_CONFIG search order)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the dashboard listen address (default: "0.0.0.0:8080")
    #[arg(short, long, env = "COLDCHAIN_SERVER_ADDR")]
    addr: Option<String>,

    /// Realtime database base URL for the reading log
    #[arg(long, env = "COLDCHAIN_DB_URL")]
    source_url: Option<String>,

    /// Container identifier being monitored
    #[arg(long, env = "COLDCHAIN_CONTAINER")]
    container: Option<String>,

    /// Seconds between polls
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Replay a CSV file (id,timestamp,temperature) instead of polling
    #[arg(long, value_name = "CSV")]
    replay: Option<PathBuf>,
}

impl CliArgs {
    /// Load the config file, then layer environment and CLI overrides on top.
    fn resolve_config(&self) -> Result<MonitorConfig> {
        let mut cfg = match self.config {
            Some(ref path) => MonitorConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => MonitorConfig::load(),
        };
        cfg.apply_env_overrides();

        if let Some(ref addr) = self.addr {
            cfg.server.addr = addr.clone();
        }
        if let Some(ref url) = self.source_url {
            cfg.source.base_url = url.clone();
            cfg.store.database_url = url.clone();
        }
        if let Some(ref id) = self.container {
            cfg.container.id = id.clone();
        }
        if let Some(secs) = self.poll_interval {
            cfg.source.poll_interval_secs = secs;
        }
        cfg.validate().context("Invalid configuration after overrides")?;
        Ok(cfg)
    }
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    Poller,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::Poller => write!(f, "Poller"),
        }
    }
}

// ============================================================================
// Shared Initialization
// ============================================================================

/// State shared between the HTTP server and the poller.
struct MonitorCore {
    app_state: Arc<RwLock<AppState>>,
    toasts: ToastFeed,
    refresh: Arc<Notify>,
    listener: tokio::net::TcpListener,
    app: Router,
}

async fn init_core(cfg: &MonitorConfig) -> Result<MonitorCore> {
    let app_state = Arc::new(RwLock::new(AppState::from_config()));
    let toasts = ToastFeed::new(cfg.notify.toast_capacity);
    let refresh = Arc::new(Notify::new());

    let timeout = Duration::from_secs(cfg.source.request_timeout_secs);
    let store = RealtimeDbClient::new(&cfg.store.database_url, cfg.store.auth_token.clone(), timeout);
    let relay = RelayClient::new(&cfg.notify.relay_url, timeout);
    let admin = AdminService::new(Arc::new(store), Some(relay));

    let dashboard = DashboardState::new(Arc::clone(&app_state), toasts.clone(), Arc::new(cfg.clone()))
        .with_refresh(Arc::clone(&refresh))
        .with_admin(admin);
    let app = create_app(dashboard);

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.addr))?;
    info!("🌐 Dashboard API listening on http://{}", cfg.server.addr);

    Ok(MonitorCore {
        app_state,
        toasts,
        refresh,
        listener,
        app,
    })
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: All tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("🛑 Supervisor: Shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("🔒 Supervisor: Task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("🔒 Supervisor: Task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("🔒 Supervisor: Task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("🔒 Supervisor: All tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let in-flight tasks observe the cancellation before returning.
    while task_set.join_next().await.is_some() {}
    Ok(())
}

// ============================================================================
// Unified Monitor Runner
// ============================================================================

/// Run the dashboard and the polling loop with any reading source.
async fn run_monitor<S: ReadingSource + Sync>(
    source: S,
    cfg: &MonitorConfig,
    cancel_token: CancellationToken,
) -> Result<()> {
    let core = init_core(cfg).await?;

    info!("🔒 Supervisor: Initializing task monitoring");
    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: HTTP Server
    spawn_http_server(&mut task_set, core.listener, core.app, cancel_token.clone());

    // Task 2: Poller
    let monitor = ContainerMonitor::new(cfg.container.id.clone(), cfg);
    let dispatcher = Dispatcher::from_config(cfg, core.toasts.clone());
    let channels: Vec<String> = dispatcher
        .configured_channels()
        .iter()
        .map(ToString::to_string)
        .collect();
    info!("📣 Notification channels: {}", channels.join(", "));

    let poll_interval = Duration::from_secs(cfg.source.poll_interval_secs);
    let processing_loop = ProcessingLoop::new(
        source,
        monitor,
        dispatcher,
        core.app_state,
        core.toasts,
        cancel_token.clone(),
        poll_interval,
    )
    .with_refresh(core.refresh);

    task_set.spawn(async move {
        info!("[Poller] Task starting");
        let _stats = processing_loop.run().await;
        Ok(TaskName::Poller)
    });

    run_supervisor(&mut task_set, cancel_token).await
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let cfg = args.resolve_config()?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  ColdChain Monitor");
    info!("  Temperature evaluation and alert escalation");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "📦 Container: {} | Safe band: {:.1}-{:.1}°C | Poll: {}s",
        cfg.container.id,
        cfg.thresholds.safe_min,
        cfg.thresholds.safe_max,
        cfg.source.poll_interval_secs
    );
    if cfg.notify.email_to.is_none() && cfg.notify.sms_to.is_none() {
        warn!("No ALERT_EMAIL_TO / ALERT_SMS_TO configured: alerts stay in-app only");
    }

    config::init(cfg.clone());

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    if let Some(ref path) = args.replay {
        // --- Replay mode ---
        let readings = read_csv_readings(path)
            .with_context(|| format!("Failed to load replay file {}", path.display()))?;
        info!("📥 Input: CSV replay ({} readings from {})", readings.len(), path.display());
        let source = CsvReplaySource::new(readings, 1, cfg.source.fetch_limit);
        run_monitor(source, &cfg, cancel_token).await?;
    } else {
        // --- Live mode ---
        let source = RtdbSource::new(&cfg.source, cfg.store.auth_token.clone())
            .context("Failed to build reading source")?;
        info!("📥 Input: realtime database ({})", source.url());
        run_monitor(source, &cfg, cancel_token).await?;
    }

    info!("");
    info!("✓ ColdChain Monitor shutdown complete");
    Ok(())
}
