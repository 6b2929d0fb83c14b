//! Risk assessment types produced by the risk estimator

use serde::{Deserialize, Serialize};

/// Overall risk level for the current temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

/// Estimated time until the safe band is breached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum TimeToBreach {
    /// Already outside the safe band
    Now,
    /// Minutes until breach at the current trajectory
    Minutes(u32),
}

impl std::fmt::Display for TimeToBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeToBreach::Now => write!(f, "Now"),
            TimeToBreach::Minutes(m) => write!(f, "{m} min"),
        }
    }
}

/// Spoilage risk derived from the rolling temperature window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpoilageRisk {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for SpoilageRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpoilageRisk::Low => write!(f, "LOW"),
            SpoilageRisk::Medium => write!(f, "MEDIUM"),
            SpoilageRisk::High => write!(f, "HIGH"),
            SpoilageRisk::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Result of the spoilage estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoilageAssessment {
    pub risk: SpoilageRisk,
    /// Hours until spoilage; `None` when there is no risk or too little history
    pub hours_to_spoilage: Option<u32>,
    /// Mean of the samples used, `None` when history was insufficient
    pub window_mean: Option<f64>,
    pub message: String,
}

impl SpoilageAssessment {
    /// True when fewer samples than the estimator window were available.
    pub fn is_insufficient(&self) -> bool {
        self.window_mean.is_none()
    }
}

/// Full risk assessment, recomputed on every new reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub time_to_breach: Option<TimeToBreach>,
    pub recommendation: String,
    /// 0-100
    pub confidence: u8,
    pub spoilage: SpoilageAssessment,
}
