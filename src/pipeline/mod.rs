//! Processing Pipeline Module
//!
//! ```text
//! ReadingSource::poll ──► ReadingIngestor (new-data detection)
//!                              │
//!                              ▼
//!                     ContainerMonitor::ingest
//!          (classify, trend, rolling history, risk, escalation)
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        AppState (dashboard)       Dispatcher (in-app, email, SMS)
//! ```
//!
//! Polls are serialized through one [`ProcessingLoop`]; dispatch is awaited
//! before the next tick.

mod state;
pub mod ingestor;
pub mod monitor;
pub mod processing_loop;
pub mod source;

pub use ingestor::{FreshReadings, ReadingIngestor};
pub use monitor::{ContainerMonitor, IngestOutcome, PollOutcome};
pub use processing_loop::{LoopStats, ProcessingLoop};
pub use source::{ReadingSource, ScriptedSource};
pub use state::*;
