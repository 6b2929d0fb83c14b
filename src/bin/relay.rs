//! Notification Relay - email/SMS forwarding server for the monitor and admin console
//!
//! ```bash
//! cargo run --release --bin relay
//! ```
//!
//! ## Environment variables
//!
//! | Variable                  | Required | Description                                  |
//! |---------------------------|----------|----------------------------------------------|
//! | `PORT`                    | No       | Listen port (default: 5000)                  |
//! | `RELAY_EMAIL_WEBHOOK_URL` | No       | Upstream email gateway (log-only when unset) |
//! | `RELAY_SMS_WEBHOOK_URL`   | No       | Upstream SMS gateway (log-only when unset)   |
//! | `RELAY_API_TOKEN`         | No       | Bearer token sent to the upstream gateways   |
//! | `RELAY_EMAIL_FROM`        | No       | Sender address for outbound email            |

use anyhow::Context;
use clap::Parser;
use coldchain_monitor::config::defaults;
use coldchain_monitor::relay::{create_relay_app, ProviderSettings, RelayState};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "relay", about = "ColdChain notification relay (email + SMS)")]
struct CliArgs {
    /// Port to listen on (default: 5000)
    #[arg(long, short, env = "PORT")]
    port: Option<u16>,

    /// Bind address (overrides --port)
    #[arg(long)]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let bind_address = args
        .bind_address
        .unwrap_or_else(|| format!("0.0.0.0:{}", args.port.unwrap_or(defaults::RELAY_PORT)));

    let provider = ProviderSettings::from_env().build();
    info!(provider = provider.name(), "[Relay] Message provider selected");

    let app = create_relay_app(RelayState::new(provider));
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "[Relay] Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[Relay] Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Relay] Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("[Relay] Shutdown signal received");
}
