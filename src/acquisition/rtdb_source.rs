//! Realtime database reading source
//!
//! Polls `{base}/{path}.json?orderBy="$key"&limitToLast=N` and decodes the
//! JSON object keyed by opaque push IDs into readings sorted by timestamp.
//! A `null` body means the path does not exist yet, which is "no data".

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::IngestError;
use crate::config::SourceConfig;
use crate::pipeline::source::ReadingSource;
use crate::types::Reading;

/// HTTP client for the reading log.
#[derive(Clone)]
pub struct RtdbSource {
    http: reqwest::Client,
    url: String,
    fetch_limit: usize,
    auth: Option<String>,
}

impl RtdbSource {
    pub fn new(config: &SourceConfig, auth: Option<String>) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: format!(
                "{}/{}.json",
                config.base_url.trim_end_matches('/'),
                config.sensor_path.trim_matches('/')
            ),
            fetch_limit: config.fetch_limit,
            auth,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the latest window of readings, oldest first.
    pub async fn fetch(&self) -> Result<Vec<Reading>, IngestError> {
        let limit = self.fetch_limit.to_string();
        let mut req = self
            .http
            .get(&self.url)
            .query(&[("orderBy", "\"$key\""), ("limitToLast", limit.as_str())]);
        if let Some(ref token) = self.auth {
            req = req.query(&[("auth", token.as_str())]);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(IngestError::Status(resp.status()));
        }

        let body: Value = resp.json().await?;
        let readings = decode_readings(body)?;
        debug!(count = readings.len(), "[RtdbSource] Fetched readings");
        Ok(readings)
    }
}

#[async_trait]
impl ReadingSource for RtdbSource {
    async fn poll(&mut self) -> Result<Vec<Reading>, IngestError> {
        self.fetch().await
    }

    fn source_name(&self) -> &str {
        "realtime-db"
    }
}

// ============================================================================
// Payload Decoding
// ============================================================================

/// Decode a reading-log payload into readings sorted ascending by timestamp.
///
/// Accepts the keyed-object form and the array form the database produces
/// for integer keys (`null` holes are skipped). Numeric strings are accepted
/// for both fields; a missing or non-numeric field is an error.
pub fn decode_readings(body: Value) -> Result<Vec<Reading>, IngestError> {
    let mut readings = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(id, entry)| decode_entry(id, &entry))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_null())
            .map(|(i, entry)| decode_entry(i.to_string(), &entry))
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(IngestError::Malformed {
                id: String::new(),
                reason: format!("expected an object of readings, got {}", type_name(&other)),
            })
        }
    };

    readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    Ok(readings)
}

fn decode_entry(id: String, entry: &Value) -> Result<Reading, IngestError> {
    let Some(fields) = entry.as_object() else {
        return Err(IngestError::Malformed {
            reason: format!("expected an object, got {}", type_name(entry)),
            id,
        });
    };

    let temperature = match fields.get("temperature").and_then(as_number) {
        Some(t) if t.is_finite() => t,
        Some(_) => {
            return Err(IngestError::Malformed {
                id,
                reason: "temperature is not finite".to_string(),
            })
        }
        None => {
            return Err(IngestError::Malformed {
                id,
                reason: "missing or non-numeric 'temperature'".to_string(),
            })
        }
    };

    let timestamp = match fields.get("timestamp").and_then(as_number) {
        Some(ts) if ts.is_finite() && ts >= 0.0 => ts.floor() as u64,
        _ => {
            return Err(IngestError::Malformed {
                id,
                reason: "missing or invalid 'timestamp'".to_string(),
            })
        }
    };

    Ok(Reading {
        id,
        timestamp,
        temperature,
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
