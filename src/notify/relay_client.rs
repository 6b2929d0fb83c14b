//! Relay Client — HTTP client for the notification relay
//!
//! Sends `POST /send-email` and `POST /send-sms` and interprets the relay's
//! `{ success, msg | error }` response.

use serde::Serialize;
use std::time::Duration;

use super::dispatcher::DispatchError;
use crate::relay::{EmailRequest, RelayResponse, SmsRequest};

#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send an email through the relay. Returns the relay's confirmation text.
    pub async fn send_email(&self, to: &str, subject: &str, message: &str) -> Result<String, DispatchError> {
        let body = EmailRequest {
            to: to.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        };
        self.post("send-email", &body).await
    }

    /// Send an SMS through the relay. Returns the relay's confirmation text.
    pub async fn send_sms(&self, to: &str, message: &str) -> Result<String, DispatchError> {
        let body = SmsRequest {
            to: to.to_string(),
            message: message.to_string(),
        };
        self.post("send-sms", &body).await
    }

    async fn post<T: Serialize + Sync>(&self, route: &str, body: &T) -> Result<String, DispatchError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, route))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        match serde_json::from_str::<RelayResponse>(&text) {
            Ok(reply) if reply.success && status.is_success() => Ok(reply.msg.unwrap_or_default()),
            Ok(reply) => Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: reply
                    .error
                    .or(reply.msg)
                    .unwrap_or_else(|| "relay reported failure".to_string()),
            }),
            Err(_) => Err(DispatchError::Rejected {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            }),
        }
    }
}
