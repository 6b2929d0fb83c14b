//! Core domain types for cold-chain monitoring
//!
//! - `reading`: Reading, Status, Trend, SensorState
//! - `risk`: RiskAssessment, RiskLevel, TimeToBreach, SpoilageAssessment
//! - `alert`: AlertEvent, Priority, AlertKind, Channel
//! - `container`: provisioning records for the admin console

mod alert;
mod container;
mod reading;
mod risk;

pub use alert::*;
pub use container::*;
pub use reading::*;
pub use risk::*;
