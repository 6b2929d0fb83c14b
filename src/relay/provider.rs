//! Outbound message providers behind the relay

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{EmailRequest, SmsRequest};
use crate::config::defaults;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0} delivery is not configured")]
    NotConfigured(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Something that can actually deliver an email or SMS.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn send_email(&self, req: &EmailRequest) -> Result<(), RelayError>;
    async fn send_sms(&self, req: &SmsRequest) -> Result<(), RelayError>;
}

// ============================================================================
// Provider Settings
// ============================================================================

/// Relay provider configuration, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub email_webhook_url: Option<String>,
    pub sms_webhook_url: Option<String>,
    pub api_token: Option<String>,
    pub email_from: Option<String>,
}

impl ProviderSettings {
    /// `RELAY_EMAIL_WEBHOOK_URL`, `RELAY_SMS_WEBHOOK_URL`, `RELAY_API_TOKEN`, `RELAY_EMAIL_FROM`.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            email_webhook_url: var("RELAY_EMAIL_WEBHOOK_URL"),
            sms_webhook_url: var("RELAY_SMS_WEBHOOK_URL"),
            api_token: var("RELAY_API_TOKEN"),
            email_from: var("RELAY_EMAIL_FROM"),
        }
    }

    /// Webhook provider when any upstream is configured, log-only otherwise.
    pub fn build(self) -> Arc<dyn MessageProvider> {
        if self.email_webhook_url.is_some() || self.sms_webhook_url.is_some() {
            Arc::new(WebhookProvider::new(self))
        } else {
            Arc::new(LogProvider::default())
        }
    }
}

// ============================================================================
// Webhook Provider
// ============================================================================

/// Forwards messages as JSON POSTs to upstream email/SMS gateways.
pub struct WebhookProvider {
    http: reqwest::Client,
    settings: ProviderSettings,
}

impl WebhookProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, settings }
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<(), RelayError> {
        let mut req = self.http.post(url).json(&body);
        if let Some(ref token) = self.settings.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl MessageProvider for WebhookProvider {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send_email(&self, req: &EmailRequest) -> Result<(), RelayError> {
        let url = self
            .settings
            .email_webhook_url
            .as_deref()
            .ok_or(RelayError::NotConfigured("email"))?;
        self.post(
            url,
            json!({
                "from": self.settings.email_from,
                "to": req.to,
                "subject": req.subject,
                "text": req.message,
            }),
        )
        .await
    }

    async fn send_sms(&self, req: &SmsRequest) -> Result<(), RelayError> {
        let url = self
            .settings
            .sms_webhook_url
            .as_deref()
            .ok_or(RelayError::NotConfigured("SMS"))?;
        self.post(url, json!({ "to": req.to, "body": req.message })).await
    }
}

// ============================================================================
// Log Provider
// ============================================================================

/// Logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct LogProvider {
    sent: AtomicU64,
}

impl LogProvider {
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageProvider for LogProvider {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_email(&self, req: &EmailRequest) -> Result<(), RelayError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        info!(to = %req.to, subject = %req.subject, "[Relay] (log only) email\n{}", req.message);
        Ok(())
    }

    async fn send_sms(&self, req: &SmsRequest) -> Result<(), RelayError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        info!(to = %req.to, "[Relay] (log only) SMS\n{}", req.message);
        Ok(())
    }
}
