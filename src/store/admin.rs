//! Admin console backend: container provisioning and user accounts
//!
//! Containers live under `containers/{pushKey}`, accounts under
//! `users/{sanitizedEmail}`. Credential emails go through the relay; a relay
//! failure is logged and reported back but never undoes the write.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use super::{StoreError, TreeStore};
use crate::notify::messages::{password_reset_email, welcome_email};
use crate::notify::RelayClient;
use crate::types::{
    ContainerRecord, ContainerStatus, FleetStats, NewContainer, StoredContainer, TemperatureRange,
    UserRecord,
};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();

// ============================================================================
// Errors
// ============================================================================

/// Malformed admin-form input. Nothing is written when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Container ID '{0}' already exists. Please use a different ID.")]
    DuplicateContainer(String),
    #[error("Invalid container status '{0}' (expected active, inactive or maintenance)")]
    InvalidStatus(String),
    #[error("Invalid temperature range: min {min} must be below max {max}")]
    InvalidTemperatureRange { min: f64, max: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
}

// ============================================================================
// Helpers
// ============================================================================

/// Store key for an email: lowercase, `@` → `_at_`, `.` → `_dot_`, any
/// other non-alphanumeric → `_`.
pub fn sanitize_email(email: &str) -> String {
    let mut key = String::with_capacity(email.len() + 8);
    for c in email.to_lowercase().chars() {
        match c {
            '@' => key.push_str("_at_"),
            '.' => key.push_str("_dot_"),
            c if c.is_ascii_alphanumeric() || c == '_' => key.push(c),
            _ => key.push('_'),
        }
    }
    key
}

/// `Firstname@123` from the first word of the customer name, `User@123`
/// for a blank name.
pub fn generate_password(customer_name: &str) -> String {
    let Some(first) = customer_name.split_whitespace().next() else {
        return "User@123".to_string();
    };
    let mut chars = first.chars();
    let capitalized: String = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };
    format!("{capitalized}@123")
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

fn validate_new_container(input: &NewContainer) -> Result<TemperatureRange, ValidationError> {
    let mut missing = Vec::new();
    if input.id.trim().is_empty() {
        missing.push("Container ID");
    }
    if input.customer_email.trim().is_empty() {
        missing.push("Customer Email");
    }
    if input.customer_phone.trim().is_empty() {
        missing.push("Customer Phone");
    }
    if input.customer_name.trim().is_empty() {
        missing.push("Customer Name");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    if !is_valid_email(input.customer_email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    let range = input.temperature_range.unwrap_or_default();
    if !(range.min < range.max) {
        return Err(ValidationError::InvalidTemperatureRange {
            min: range.min,
            max: range.max,
        });
    }
    Ok(range)
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of provisioning a container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedContainer {
    pub key: String,
    pub container: ContainerRecord,
    pub user_path: String,
    pub password: String,
    pub email_sent: bool,
}

/// Outcome of a password reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordReset {
    pub email: String,
    pub password: String,
    pub email_sent: bool,
}

/// User account as listed in the console (no password).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub key: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub role: String,
    pub container_id: String,
    pub created_at: String,
    pub is_active: bool,
}

impl UserSummary {
    fn from_record(key: String, user: UserRecord) -> Self {
        Self {
            key,
            email: user.email,
            phone: user.phone,
            name: user.name,
            role: user.role,
            container_id: user.container_id,
            created_at: user.created_at,
            is_active: user.is_active,
        }
    }
}

// ============================================================================
// Admin Service
// ============================================================================

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn TreeStore>,
    relay: Option<RelayClient>,
}

impl AdminService {
    pub fn new(store: Arc<dyn TreeStore>, relay: Option<RelayClient>) -> Self {
        Self { store, relay }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Validate, store the container and its user account, then email the
    /// credentials.
    pub async fn create_container(&self, input: NewContainer) -> Result<CreatedContainer, AdminError> {
        let range = validate_new_container(&input)?;
        let id = input.id.trim().to_string();
        if self.list_containers().await?.iter().any(|c| c.record.id == id) {
            return Err(ValidationError::DuplicateContainer(id).into());
        }

        let email = input.customer_email.trim().to_lowercase();
        let name = input.customer_name.trim().to_string();
        let phone = input.customer_phone.trim().to_string();
        let password = generate_password(&name);
        let now = chrono::Utc::now().to_rfc3339();

        let container = ContainerRecord {
            id: id.clone(),
            customer_email: email.clone(),
            customer_phone: phone.clone(),
            customer_name: name.clone(),
            status: ContainerStatus::Active,
            alerts: 0,
            created_at: now.clone(),
            is_active: true,
            temperature_range: range,
        };
        let key = self
            .store
            .push("containers", serde_json::to_value(&container)?)
            .await?;

        let user_path = format!("users/{}", sanitize_email(&email));
        let user = UserRecord {
            email: email.clone(),
            phone,
            name: name.clone(),
            password: password.clone(),
            role: "user".to_string(),
            container_id: id.clone(),
            created_at: now,
            is_active: true,
            last_login: None,
        };
        self.store.set(&user_path, serde_json::to_value(&user)?).await?;
        info!(container = %id, key = %key, user = %user_path, "[Admin] Container provisioned");

        let (subject, message) = welcome_email(&name, &id, &email, &password);
        let email_sent = self.send_email(&email, &subject, &message).await;

        Ok(CreatedContainer {
            key,
            container,
            user_path,
            password,
            email_sent,
        })
    }

    /// All containers, ordered by store key. Malformed records are skipped.
    pub async fn list_containers(&self) -> Result<Vec<StoredContainer>, AdminError> {
        let Some(Value::Object(map)) = self.store.get("containers").await? else {
            return Ok(Vec::new());
        };
        let mut containers: Vec<StoredContainer> = map
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<ContainerRecord>(value) {
                Ok(record) => Some(StoredContainer { key, record }),
                Err(e) => {
                    warn!(key = %key, error = %e, "[Admin] Skipping malformed container record");
                    None
                }
            })
            .collect();
        containers.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(containers)
    }

    pub async fn delete_container(&self, key: &str) -> Result<(), AdminError> {
        let path = format!("containers/{key}");
        if self.store.get(&path).await?.is_none() {
            return Err(AdminError::NotFound(format!("Container {key}")));
        }
        self.store.remove(&path).await?;
        info!(key, "[Admin] Container deleted");
        Ok(())
    }

    pub async fn update_status(&self, key: &str, status: &str) -> Result<ContainerStatus, AdminError> {
        let status: ContainerStatus = status
            .parse()
            .map_err(|_| ValidationError::InvalidStatus(status.to_string()))?;
        let path = format!("containers/{key}");
        if self.store.get(&path).await?.is_none() {
            return Err(AdminError::NotFound(format!("Container {key}")));
        }
        self.store
            .set(&format!("{path}/status"), Value::String(status.to_string()))
            .await?;
        info!(key, status = %status, "[Admin] Container status updated");
        Ok(status)
    }

    /// All user accounts, ordered by store key, without passwords.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AdminError> {
        let Some(Value::Object(map)) = self.store.get("users").await? else {
            return Ok(Vec::new());
        };
        let mut users: Vec<UserSummary> = map
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<UserRecord>(value) {
                Ok(user) => Some(UserSummary::from_record(key, user)),
                Err(e) => {
                    warn!(key = %key, error = %e, "[Admin] Skipping malformed user record");
                    None
                }
            })
            .collect();
        users.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(users)
    }

    /// Regenerate the password from the account name, store it and email it.
    pub async fn reset_password(&self, email: &str) -> Result<PasswordReset, AdminError> {
        let email = email.trim().to_lowercase();
        let path = format!("users/{}", sanitize_email(&email));
        let user: UserRecord = match self.store.get(&path).await? {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(AdminError::NotFound(format!("User {email}"))),
        };

        let password = generate_password(&user.name);
        self.store
            .set(&format!("{path}/password"), Value::String(password.clone()))
            .await?;
        info!(user = %path, "[Admin] Password reset");

        let (subject, message) = password_reset_email(&user.name, &email, &password);
        let email_sent = self.send_email(&email, &subject, &message).await;
        Ok(PasswordReset {
            email,
            password,
            email_sent,
        })
    }

    pub async fn delete_user(&self, email: &str) -> Result<(), AdminError> {
        let path = format!("users/{}", sanitize_email(email.trim()));
        if self.store.get(&path).await?.is_none() {
            return Err(AdminError::NotFound(format!("User {}", email.trim())));
        }
        self.store.remove(&path).await?;
        info!(user = %path, "[Admin] User deleted");
        Ok(())
    }

    /// Totals for the console overview cards.
    pub async fn stats(&self) -> Result<FleetStats, AdminError> {
        Ok(fleet_stats(&self.list_containers().await?))
    }

    async fn send_email(&self, to: &str, subject: &str, message: &str) -> bool {
        let Some(ref relay) = self.relay else {
            warn!(to, "[Admin] No relay configured, credentials email not sent");
            return false;
        };
        match relay.send_email(to, subject, message).await {
            Ok(_) => true,
            Err(e) => {
                warn!(to, error = %e, "[Admin] Failed to send credentials email");
                false
            }
        }
    }
}

pub fn fleet_stats(containers: &[StoredContainer]) -> FleetStats {
    let customers: HashSet<String> = containers
        .iter()
        .map(|c| c.record.customer_email.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    FleetStats {
        total_containers: containers.len(),
        active_containers: containers
            .iter()
            .filter(|c| c.record.status == ContainerStatus::Active)
            .count(),
        total_alerts: containers.iter().map(|c| u64::from(c.record.alerts)).sum(),
        customers: customers.len(),
    }
}
