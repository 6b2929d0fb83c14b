//! ColdChain Monitor: temperature evaluation and alert escalation
//!
//! Turns a polled stream of container temperature readings into a status
//! band, trend, spoilage-risk estimate and deduplicated multi-channel
//! notifications.
//!
//! ## Architecture
//!
//! - **Acquisition**: realtime-database and CSV replay reading sources
//! - **Engine**: classifier, risk estimator, ordered escalation rules, cooldowns
//! - **Pipeline**: new-data detection, per-container monitor, polling loop
//! - **Notify**: priority routing to in-app toasts, email and SMS via the relay
//! - **Relay**: the email/SMS relay backend
//! - **Store / API**: admin console backend and the dashboard REST API

pub mod acquisition;
pub mod api;
pub mod config;
pub mod engine;
pub mod notify;
pub mod pipeline;
pub mod relay;
pub mod store;
pub mod types;

// Re-export configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{
    AlertEvent, AlertKind, Channel, Priority, Reading, RiskAssessment, RiskLevel, SensorState,
    SpoilageAssessment, SpoilageRisk, Status, Trend,
};

// Re-export the engine entry points
pub use engine::{classify, estimate_spoilage, trend, EscalationEngine, RiskEstimator};

// Re-export pipeline components
pub use pipeline::{AppState, ContainerMonitor, IngestOutcome, ProcessingLoop, ReadingSource};
