//! Provisioning records stored under `containers/{key}` and `users/{sanitizedEmail}`

use serde::{Deserialize, Serialize};

/// Administrative status of a provisioned container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
}

impl std::str::FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(format!("unknown container status '{other}'")),
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Active => write!(f, "active"),
            ContainerStatus::Inactive => write!(f, "inactive"),
            ContainerStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// Target temperature range for the goods in a container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: 2.0, max: 8.0 }
    }
}

/// Admin form input for provisioning a container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub temperature_range: Option<TemperatureRange>,
}

/// Container record as stored in the realtime database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_name: String,
    pub status: ContainerStatus,
    #[serde(default)]
    pub alerts: u32,
    pub created_at: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub temperature_range: TemperatureRange,
}

/// A container record together with the store key it lives under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredContainer {
    pub key: String,
    #[serde(flatten)]
    pub record: ContainerRecord,
}

/// Customer account stored under `users/{sanitizedEmail}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub container_id: String,
    pub created_at: String,
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Aggregate numbers for the admin overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FleetStats {
    pub total_containers: usize,
    pub active_containers: usize,
    pub total_alerts: u64,
    pub customers: usize,
}
