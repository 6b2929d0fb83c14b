//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`.
//! The admin endpoints run against the in-memory tree store.

use coldchain_monitor::api::{create_app, DashboardState};
use coldchain_monitor::config::MonitorConfig;
use coldchain_monitor::notify::{Toast, ToastFeed, ToastLevel};
use coldchain_monitor::pipeline::{AppState, ChartPoint};
use coldchain_monitor::store::{AdminService, MemoryTree};
use coldchain_monitor::types::{Reading, SensorState, Status, Trend};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tower::ServiceExt;

fn create_test_state() -> DashboardState {
    DashboardState::new(
        Arc::new(RwLock::new(AppState::new("TEST-CONTAINER", 100))),
        ToastFeed::new(50),
        Arc::new(MonitorConfig::default()),
    )
}

fn create_admin_state() -> DashboardState {
    create_test_state().with_admin(AdminService::new(Arc::new(MemoryTree::new()), None))
}

fn now_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap()
}

async fn send(state: &DashboardState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = create_app(state.clone())
        .oneshot(req.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get(state: &DashboardState, uri: &str) -> (StatusCode, Value) {
    send(state, Method::GET, uri, None).await
}

fn new_container(id: &str, email: &str, name: &str) -> Value {
    json!({
        "id": id,
        "customerEmail": email,
        "customerPhone": "+15550100",
        "customerName": name,
    })
}

// ============================================================================
// Monitoring endpoints
// ============================================================================

/// All v1 GET endpoints should return 200.
#[tokio::test]
async fn test_v1_get_endpoints_return_200() {
    let state = create_admin_state();
    let endpoints = [
        "/health",
        "/api/v1/status",
        "/api/v1/risk",
        "/api/v1/alerts",
        "/api/v1/toasts",
        "/api/v1/readings",
        "/api/v1/config",
        "/api/v1/containers",
        "/api/v1/stats",
        "/api/v1/users",
    ];

    for endpoint in &endpoints {
        let (status, _) = get(&state, endpoint).await;
        assert!(status.is_success(), "GET {endpoint} returned status {status}");
    }
}

#[tokio::test]
async fn test_responses_use_envelope() {
    let state = create_test_state();
    let (status, json) = get(&state, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].is_object());
    assert_eq!(json["meta"]["version"], "1");
    assert_eq!(json["data"]["container_id"], "TEST-CONTAINER");
    assert_eq!(json["data"]["system_status"], "Initializing");
    assert!(json["data"]["sensor"].is_null());
}

#[tokio::test]
async fn test_unknown_route_returns_404_envelope() {
    let state = create_test_state();
    let (status, json) = get(&state, "/api/v1/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/api/v1/does-not-exist"));
}

#[tokio::test]
async fn test_status_reflects_sensor_state() {
    let state = create_test_state();
    {
        let mut app = state.app_state.write().await;
        app.sensor = Some(SensorState {
            current_temperature: 9.2,
            status: Status::Warning,
            trend: Trend::Up,
            last_seen_timestamp: 200,
        });
        app.baseline = Some(5.0);
        app.record_poll_success(chrono::Utc::now());
        app.refresh_status();
    }

    let (_, json) = get(&state, "/api/v1/status").await;
    let data = &json["data"];
    assert_eq!(data["connected"], true);
    assert_eq!(data["sensor"]["status"], "WARNING");
    assert_eq!(data["sensor"]["current_temperature"], 9.2);
    assert_eq!(data["baseline"], 5.0);
    assert_eq!(data["system_status"], "Alert");
}

#[tokio::test]
async fn test_health_degraded_until_first_poll() {
    let state = create_test_state();
    let (_, json) = get(&state, "/health").await;
    assert_eq!(json["data"]["status"], "degraded");

    state.app_state.write().await.record_poll_success(chrono::Utc::now());
    let (_, json) = get(&state, "/health").await;
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn test_risk_before_first_reading_is_placeholder() {
    let state = create_test_state();
    let (status, json) = get(&state, "/api/v1/risk").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["recommendation"].is_string());
    assert!(json["data"]["spoilage"].is_object());
}

#[tokio::test]
async fn test_readings_range_filter() {
    let state = create_test_state();
    let now = now_secs();
    {
        let mut app = state.app_state.write().await;
        for (age, temp) in [(30 * 3600, 4.0), (3 * 3600, 5.0), (600, 6.0)] {
            let reading = Reading::new(format!("r{age}"), now - age, temp);
            app.push_chart(ChartPoint::new(&reading, Status::Safe));
        }
    }

    let (_, json) = get(&state, "/api/v1/readings?range=1h").await;
    assert_eq!(json["data"]["count"], 1);
    let (_, json) = get(&state, "/api/v1/readings?range=6h").await;
    assert_eq!(json["data"]["count"], 2);
    let (_, json) = get(&state, "/api/v1/readings").await;
    assert_eq!(json["data"]["count"], 3);
    assert_eq!(json["data"]["range"], "all");
}

#[tokio::test]
async fn test_readings_bad_range_is_400() {
    let state = create_test_state();
    let (status, json) = get(&state, "/api/v1/readings?range=7d").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_csv_export() {
    let state = create_test_state();
    {
        let mut app = state.app_state.write().await;
        let reading = Reading::new("-abc", now_secs() - 60, 9.25);
        app.push_chart(ChartPoint::new(&reading, Status::Warning));
    }

    let resp = create_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/readings/export.csv?range=24h")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("TEST-CONTAINER_readings_"));

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,timestamp,iso_time,temperature,status"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("-abc,"));
    assert!(row.contains(",9.25,"));
    assert!(row.ends_with("WARNING"));
}

#[tokio::test]
async fn test_refresh_wakes_poller() {
    let refresh = Arc::new(Notify::new());
    let state = create_test_state().with_refresh(Arc::clone(&refresh));

    let (status, _) = send(&state, Method::POST, "/api/v1/refresh", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(1), refresh.notified())
        .await
        .expect("refresh notification should be pending");
}

#[tokio::test]
async fn test_toasts_listed_and_cleared() {
    let state = create_test_state();
    state
        .toasts
        .push(Toast::new(ToastLevel::Warning, "Email failed", "relay unreachable"))
        .await;

    let (_, json) = get(&state, "/api/v1/toasts").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["level"], "warning");

    let (status, _) = send(&state, Method::DELETE, "/api/v1/toasts", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, json) = get(&state, "/api/v1/toasts").await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_config_exposes_thresholds() {
    let state = create_test_state();
    let (_, json) = get(&state, "/api/v1/config").await;
    assert_eq!(json["data"]["thresholds"]["safe_min"], 2.0);
    assert_eq!(json["data"]["thresholds"]["safe_max"], 8.0);
    assert_eq!(json["data"]["escalation"]["cooldown_secs"], 300);
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[tokio::test]
async fn test_admin_unavailable_without_store() {
    let state = create_test_state();
    let (status, json) = get(&state, "/api/v1/containers").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "ADMIN_DISABLED");
}

#[tokio::test]
async fn test_create_container_provisions_user() {
    let state = create_admin_state();
    let (status, json) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-7", "Jane.Doe@Example.com", "jane doe")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["password"], "Jane@123");
    assert_eq!(data["user_path"], "users/jane_dot_doe_at_example_dot_com");
    assert_eq!(data["email_sent"], false);
    assert_eq!(data["container"]["status"], "active");
    assert_eq!(data["container"]["temperatureRange"]["min"], 2.0);

    let (_, users) = get(&state, "/api/v1/users").await;
    let users = users["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["containerId"], "CONT-7");
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn test_create_container_validation() {
    let state = create_admin_state();

    let (status, json) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(json!({ "id": "CONT-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Please fill in"));

    let (status, _) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-1", "not-an-email", "Ann")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-1", "ann@example.com", "Ann")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-1", "bob@example.com", "Bob")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "DUPLICATE_CONTAINER");
}

#[tokio::test]
async fn test_container_status_and_delete() {
    let state = create_admin_state();
    let (_, created) = send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-2", "ops@example.com", "Ops Team")),
    )
    .await;
    let key = created["data"]["key"].as_str().unwrap().to_string();

    let (status, json) = send(
        &state,
        Method::PATCH,
        &format!("/api/v1/containers/{key}/status"),
        Some(json!({ "status": "maintenance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "maintenance");

    let (status, _) = send(
        &state,
        Method::PATCH,
        &format!("/api/v1/containers/{key}/status"),
        Some(json!({ "status": "broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = get(&state, "/api/v1/stats").await;
    assert_eq!(stats["data"]["total_containers"], 1);
    assert_eq!(stats["data"]["active_containers"], 0);

    let uri = format!("/api/v1/containers/{key}");
    let (status, _) = send(&state, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&state, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_password_and_delete_user() {
    let state = create_admin_state();
    send(
        &state,
        Method::POST,
        "/api/v1/containers",
        Some(new_container("CONT-3", "mo@example.com", "mohammed ali")),
    )
    .await;

    let (status, json) = send(
        &state,
        Method::POST,
        "/api/v1/users/mo@example.com/reset-password",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["password"], "Mohammed@123");

    let (status, _) = send(&state, Method::DELETE, "/api/v1/users/mo@example.com", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &state,
        Method::POST,
        "/api/v1/users/mo@example.com/reset-password",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
