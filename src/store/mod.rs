//! Realtime database tree access
//!
//! Abstracts the JSON tree behind the admin console so backends can be
//! swapped without touching the admin service:
//! - `RealtimeDbClient`: REST access to a hosted realtime database
//! - `MemoryTree`: in-memory tree for tests and local runs
//!
//! Paths are slash-separated (`containers/{key}`, `users/{sanitizedEmail}`).

pub mod admin;
pub mod memory;
pub mod rtdb;

pub use admin::{
    fleet_stats, generate_password, sanitize_email, AdminError, AdminService, CreatedContainer,
    PasswordReset, UserSummary, ValidationError,
};
pub use memory::MemoryTree;
pub use rtdb::RealtimeDbClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Tree store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid path '{0}'")]
    InvalidPath(String),
    #[error("Storage error: {0}")]
    Backend(String),
}

/// A JSON tree addressed by slash-separated paths.
///
/// Implementations must be thread-safe for shared access across handlers.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Value at `path`, `None` when absent.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the object at `path`.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Append `value` under a generated, time-ordered child key and return the key.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Delete the value at `path`. Deleting an absent path is not an error.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Split a store path into non-empty segments.
pub(crate) fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let forbidden = ['.', '#', '$', '[', ']'];
    if segments.iter().any(|s| s.contains(forbidden)) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Time-ordered push key: 12 hex digits of epoch millis plus a sequence suffix.
pub(crate) fn push_key(millis: i64, seq: u32) -> String {
    format!("-{:012x}{:04x}", millis.max(0), seq & 0xffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_skip_empty_parts() {
        assert_eq!(path_segments("/containers//abc/").unwrap(), ["containers", "abc"]);
        assert!(path_segments("").unwrap().is_empty());
    }

    #[test]
    fn forbidden_characters_rejected() {
        assert!(matches!(path_segments("users/a.b"), Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn push_keys_sort_by_time() {
        assert!(push_key(1_000, 5) < push_key(2_000, 0));
        assert!(push_key(1_000, 1) < push_key(1_000, 2));
    }
}
