//! Alert types: AlertEvent, Priority, AlertKind, Channel

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Alert priority, which also selects the notification channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Which escalation rule produced an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Jump between consecutive readings
    Spike,
    /// Distance from the session baseline
    BaselineDeviation,
    /// Extreme temperature
    Extreme,
    /// Above the safe limit
    AboveSafeLimit,
    /// Rising above the optimal band
    AboveOptimal,
    /// Near the upper limit (spoilage watch)
    NearUpperLimit,
}

impl AlertKind {
    pub fn short_code(&self) -> &'static str {
        match self {
            AlertKind::Spike => "SPIKE",
            AlertKind::BaselineDeviation => "DEVIATION",
            AlertKind::Extreme => "EXTREME",
            AlertKind::AboveSafeLimit => "ABOVE_SAFE",
            AlertKind::AboveOptimal => "ABOVE_OPTIMAL",
            AlertKind::NearUpperLimit => "WATCH",
        }
    }
}

/// Outbound notification channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Sms,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::InApp => write!(f, "in-app"),
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "SMS"),
        }
    }
}

/// A fired alert. Kept in the bounded alert log for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub container_id: String,
    pub kind: AlertKind,
    pub priority: Priority,
    pub subject: String,
    pub message: String,
    pub temperature: f64,
    pub previous_temperature: Option<f64>,
    /// Reading timestamp (epoch seconds) that triggered the alert
    pub timestamp: u64,
    /// Spoilage estimate at trigger time
    pub spoilage_info: Option<String>,
    /// Channels that accepted the notification
    pub channels_sent: BTreeSet<Channel>,
}
