//! Monitor Configuration Module
//!
//! Provides deployment configuration loaded from TOML files, so every
//! threshold, cooldown and endpoint is operator-tunable.
//!
//! ## Loading Order
//!
//! 1. `COLDCHAIN_CONFIG` environment variable (path to TOML file)
//! 2. `coldchain.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Environment overrides for endpoints and recipients are applied on top
//! (see [`MonitorConfig::apply_env_overrides`]).
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(MonitorConfig::load());
//!
//! // Anywhere in a binary:
//! let interval = config::get().source.poll_interval_secs;
//! ```
//!
//! Library components (engine, dispatcher) take their settings by value
//! and never read the global.

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// A second call is ignored with a warning.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Panics if `init()` has not been called. A missing config is a startup
/// bug, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    MONITOR_CONFIG.get().is_some()
}
