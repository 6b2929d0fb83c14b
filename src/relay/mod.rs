//! Notification relay backend
//!
//! A small HTTP service that turns `POST /send-email` and `POST /send-sms`
//! into calls on a [`MessageProvider`]. The monitor and the admin console
//! reach email and SMS only through this relay.
//!
//! Response shape for both routes:
//! - 200 `{ "success": true, "msg": "..." }`
//! - 400 `{ "success": false, "error": "..." }` for missing or blank fields
//! - 500 `{ "success": false, "error": "..." }` when the provider fails

pub mod provider;

pub use provider::{LogProvider, MessageProvider, ProviderSettings, RelayError, WebhookProvider};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SmsRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            msg: Some(msg.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[derive(Clone)]
pub struct RelayState {
    provider: Arc<dyn MessageProvider>,
}

impl RelayState {
    pub fn new(provider: Arc<dyn MessageProvider>) -> Self {
        Self { provider }
    }
}

/// Build the relay router with permissive CORS (browser admin console).
pub fn create_relay_app(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/send-email", post(send_email))
        .route("/send-sms", post(send_sms))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

type RelayReply = (StatusCode, Json<RelayResponse>);

fn bad_request(error: impl Into<String>) -> RelayReply {
    (StatusCode::BAD_REQUEST, Json(RelayResponse::failed(error)))
}

fn blank_fields(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

async fn root() -> &'static str {
    "Notification relay running"
}

async fn send_email(
    State(state): State<RelayState>,
    body: Result<Json<EmailRequest>, JsonRejection>,
) -> RelayReply {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let missing = blank_fields(&[("to", &req.to), ("subject", &req.subject), ("message", &req.message)]);
    if !missing.is_empty() {
        return bad_request(format!("Missing required fields: {}", missing.join(", ")));
    }

    match state.provider.send_email(&req).await {
        Ok(()) => {
            info!(to = %req.to, provider = state.provider.name(), "[Relay] Email sent");
            (StatusCode::OK, Json(RelayResponse::ok("Email sent successfully")))
        }
        Err(e) => {
            warn!(to = %req.to, error = %e, "[Relay] Email failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RelayResponse::failed(e.to_string())))
        }
    }
}

async fn send_sms(
    State(state): State<RelayState>,
    body: Result<Json<SmsRequest>, JsonRejection>,
) -> RelayReply {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let missing = blank_fields(&[("to", &req.to), ("message", &req.message)]);
    if !missing.is_empty() {
        return bad_request(format!("Missing required fields: {}", missing.join(", ")));
    }

    match state.provider.send_sms(&req).await {
        Ok(()) => {
            info!(to = %req.to, provider = state.provider.name(), "[Relay] SMS sent");
            (StatusCode::OK, Json(RelayResponse::ok("SMS sent successfully")))
        }
        Err(e) => {
            warn!(to = %req.to, error = %e, "[Relay] SMS failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RelayResponse::failed(e.to_string())))
        }
    }
}
