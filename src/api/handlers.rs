//! API route handlers
//!
//! Request handling for the dashboard endpoints:
//! - live status, risk assessment, alert log and toast feed
//! - chart readings with time-range filter and CSV export
//! - manual refresh trigger
//! - admin console (containers and user accounts)

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tracing::info;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::{EscalationConfig, MonitorConfig, RiskConfig, ThresholdConfig};
use crate::engine::waiting_assessment;
use crate::notify::{Toast, ToastFeed};
use crate::pipeline::{AppState, ChartPoint, DispatchWarning, TimeRange};
use crate::store::AdminService;
use crate::types::{AlertEvent, NewContainer, SensorState};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Application state from the pipeline
    pub app_state: Arc<RwLock<AppState>>,
    /// In-app toast feed
    pub toasts: ToastFeed,
    /// Wakes the processing loop for an out-of-band poll
    pub refresh: Arc<Notify>,
    /// Active configuration (read-only)
    pub config: Arc<MonitorConfig>,
    /// Admin console backend, when a store is configured
    pub admin: Option<AdminService>,
}

impl DashboardState {
    pub fn new(app_state: Arc<RwLock<AppState>>, toasts: ToastFeed, config: Arc<MonitorConfig>) -> Self {
        Self {
            app_state,
            toasts,
            refresh: Arc::new(Notify::new()),
            config,
            admin: None,
        }
    }

    pub fn with_refresh(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_admin(mut self, admin: AdminService) -> Self {
        self.admin = Some(admin);
        self
    }

    fn admin(&self) -> Result<&AdminService, Response> {
        self.admin
            .as_ref()
            .ok_or_else(ApiErrorResponse::admin_disabled)
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub container_id: String,
    pub connected: bool,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub container_id: String,
    pub system_status: String,
    pub connected: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub sensor: Option<SensorState>,
    pub status_description: Option<String>,
    pub baseline: Option<f64>,
    pub readings_processed: u64,
    pub alerts_fired: u64,
    pub alerts_suppressed: u64,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertEvent>,
    pub dispatch_warnings: Vec<DispatchWarning>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingsResponse {
    pub range: TimeRange,
    pub count: usize,
    pub readings: Vec<ChartPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub container_id: String,
    pub poll_interval_secs: u64,
    pub thresholds: ThresholdConfig,
    pub escalation: EscalationConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub range: Option<String>,
}

impl RangeQuery {
    fn parse(&self) -> Result<TimeRange, Response> {
        self.range
            .as_deref()
            .unwrap_or("all")
            .parse()
            .map_err(ApiErrorResponse::bad_request)
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

// ============================================================================
// Monitoring Handlers
// ============================================================================

/// GET /health
pub async fn health_check(State(state): State<DashboardState>) -> Response {
    let app = state.app_state.read().await;
    ApiResponse::ok(HealthResponse {
        status: if app.connectivity.connected { "ok" } else { "degraded" }.to_string(),
        container_id: app.container_id.clone(),
        connected: app.connectivity.connected,
        uptime_secs: app.uptime_secs(),
    })
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<DashboardState>) -> Response {
    let app = state.app_state.read().await;
    ApiResponse::ok(StatusResponse {
        container_id: app.container_id.clone(),
        system_status: app.status.to_string(),
        connected: app.connectivity.connected,
        last_error: app.connectivity.last_error.clone(),
        last_success: app.connectivity.last_success,
        polls_ok: app.connectivity.polls_ok,
        polls_failed: app.connectivity.polls_failed,
        sensor: app.sensor.clone(),
        status_description: app.sensor.as_ref().map(|s| s.status.description().to_string()),
        baseline: app.baseline,
        readings_processed: app.readings_processed,
        alerts_fired: app.alerts_fired,
        alerts_suppressed: app.alerts_suppressed,
        uptime_secs: app.uptime_secs(),
    })
}

/// GET /api/v1/risk
pub async fn get_risk(State(state): State<DashboardState>) -> Response {
    let risk = state.app_state.read().await.risk.clone();
    ApiResponse::ok(risk.unwrap_or_else(waiting_assessment))
}

/// GET /api/v1/alerts
pub async fn get_alerts(State(state): State<DashboardState>) -> Response {
    let app = state.app_state.read().await;
    ApiResponse::ok(AlertsResponse {
        alerts: app.alerts.clone(),
        dispatch_warnings: app.dispatch_warnings.iter().cloned().collect(),
    })
}

/// GET /api/v1/toasts
pub async fn get_toasts(State(state): State<DashboardState>) -> Response {
    let toasts: Vec<Toast> = state.toasts.snapshot().await;
    ApiResponse::ok(toasts)
}

/// DELETE /api/v1/toasts
pub async fn clear_toasts(State(state): State<DashboardState>) -> Response {
    state.toasts.clear().await;
    StatusCode::NO_CONTENT.into_response()
}

/// GET /api/v1/readings?range=1h|6h|24h|all
pub async fn get_readings(
    State(state): State<DashboardState>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let range = match query.parse() {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let readings = state.app_state.read().await.chart_points(range, now_secs());
    ApiResponse::ok(ReadingsResponse {
        range,
        count: readings.len(),
        readings,
    })
}

/// GET /api/v1/readings/export.csv?range=...
pub async fn export_readings_csv(
    State(state): State<DashboardState>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let range = match query.parse() {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let app = state.app_state.read().await;
    let csv = app.export_csv(range, now_secs());
    let disposition = format!(
        "attachment; filename=\"{}_readings_{}.csv\"",
        app.container_id,
        Utc::now().format("%Y%m%d")
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response()
}

/// POST /api/v1/refresh
pub async fn request_refresh(State(state): State<DashboardState>) -> Response {
    state.refresh.notify_one();
    info!("[API] Manual refresh requested");
    ApiResponse::accepted(serde_json::json!({ "refresh": "requested" }))
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<DashboardState>) -> Response {
    let cfg = &state.config;
    ApiResponse::ok(ConfigResponse {
        container_id: cfg.container.id.clone(),
        poll_interval_secs: cfg.source.poll_interval_secs,
        thresholds: cfg.thresholds.clone(),
        escalation: cfg.escalation.clone(),
        risk: cfg.risk.clone(),
    })
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /api/v1/containers
pub async fn list_containers(State(state): State<DashboardState>) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.list_containers().await {
        Ok(containers) => ApiResponse::ok(containers),
        Err(e) => e.into_response(),
    }
}

/// POST /api/v1/containers
pub async fn create_container(
    State(state): State<DashboardState>,
    payload: Result<Json<NewContainer>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let Json(input) = match payload {
        Ok(p) => p,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };
    match admin.create_container(input).await {
        Ok(created) => ApiResponse::created(created),
        Err(e) => e.into_response(),
    }
}

/// DELETE /api/v1/containers/:key
pub async fn delete_container(
    State(state): State<DashboardState>,
    Path(key): Path<String>,
) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.delete_container(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// PATCH /api/v1/containers/:key/status
pub async fn update_container_status(
    State(state): State<DashboardState>,
    Path(key): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.update_status(&key, &update.status).await {
        Ok(status) => ApiResponse::ok(serde_json::json!({ "key": key, "status": status })),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<DashboardState>) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.stats().await {
        Ok(stats) => ApiResponse::ok(stats),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<DashboardState>) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.list_users().await {
        Ok(users) => ApiResponse::ok(users),
        Err(e) => e.into_response(),
    }
}

/// POST /api/v1/users/:email/reset-password
pub async fn reset_password(
    State(state): State<DashboardState>,
    Path(email): Path<String>,
) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.reset_password(&email).await {
        Ok(reset) => ApiResponse::ok(reset),
        Err(e) => e.into_response(),
    }
}

/// DELETE /api/v1/users/:email
pub async fn delete_user(
    State(state): State<DashboardState>,
    Path(email): Path<String>,
) -> Response {
    let admin = match state.admin() {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match admin.delete_user(&email).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
