//! Realtime Database Client — REST access to the hosted JSON tree
//!
//! Every path maps to `{base_url}/{path}.json`; the optional auth token is
//! sent as the `auth` query parameter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::{path_segments, StoreError, TreeStore};

/// Response body of a REST push.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Clone)]
pub struct RealtimeDbClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RealtimeDbClient {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    /// REST URL for a tree path.
    pub fn url(&self, path: &str) -> Result<String, StoreError> {
        let segments = path_segments(path)?;
        Ok(format!("{}/{}.json", self.base_url, segments.join("/")))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, StoreError> {
        let mut req = self.http.request(method, self.url(path)?);
        if let Some(ref token) = self.auth_token {
            req = req.query(&[("auth", token)]);
        }
        Ok(req)
    }

    fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(StoreError::Status(status))
        }
    }
}

#[async_trait]
impl TreeStore for RealtimeDbClient {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let resp = self.request(reqwest::Method::GET, path)?.send().await?;
        let value: Value = Self::check(resp)?.json().await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let resp = self
            .request(reqwest::Method::PUT, path)?
            .json(&value)
            .send()
            .await?;
        Self::check(resp)?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let resp = self
            .request(reqwest::Method::PATCH, path)?
            .json(&fields)
            .send()
            .await?;
        Self::check(resp)?;
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, path)?
            .json(&value)
            .send()
            .await?;
        let pushed: PushResponse = Self::check(resp)?.json().await?;
        debug!(path, key = %pushed.name, "[Store] Pushed child");
        Ok(pushed.name)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let resp = self.request(reqwest::Method::DELETE, path)?.send().await?;
        Self::check(resp)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "realtime-db"
    }
}
