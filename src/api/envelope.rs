//! Dashboard response envelope
//!
//! JSON endpoints answer `{ "data": ..., "meta": { "timestamp", "version" } }`
//! on success and `{ "error": { "code", "message" }, "meta": ... }` on
//! failure. Error codes are the [`ErrorCode`] variants in
//! SCREAMING_SNAKE_CASE, so the dashboard can tell a duplicate container id
//! apart from a missing form field without parsing messages.
//!
//! Admin-console failures map onto the envelope through
//! `impl IntoResponse for AdminError`. The CSV export and the 204 responses
//! are the only ones without an envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::store::{AdminError, ValidationError};

/// Bumped when a response shape changes incompatibly.
pub const API_VERSION: &str = "1";

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: API_VERSION,
        }
    }
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    fn respond(status: StatusCode, data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::now(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn ok(data: T) -> Response {
        Self::respond(StatusCode::OK, data)
    }

    /// 201, used when the admin console creates a container.
    pub fn created(data: T) -> Response {
        Self::respond(StatusCode::CREATED, data)
    }

    /// 202, used by the manual refresh trigger.
    pub fn accepted(data: T) -> Response {
        Self::respond(StatusCode::ACCEPTED, data)
    }
}

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    ValidationFailed,
    DuplicateContainer,
    AdminDisabled,
    StoreUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateContainer => StatusCode::CONFLICT,
            ErrorCode::AdminDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::StoreUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    pub fn with_code(code: ErrorCode, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code,
                message: msg.into(),
            },
            meta: ResponseMeta::now(),
        };
        (code.status(), axum::Json(body)).into_response()
    }

    pub fn not_found(msg: impl Into<String>) -> Response {
        Self::with_code(ErrorCode::NotFound, msg)
    }

    /// Malformed query parameters (e.g. an unknown chart range).
    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::with_code(ErrorCode::BadRequest, msg)
    }

    /// The monitor was started without a realtime-database store.
    pub fn admin_disabled() -> Response {
        Self::with_code(ErrorCode::AdminDisabled, "Admin store is not configured")
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let code = match &self {
            AdminError::Validation(ValidationError::DuplicateContainer(_)) => {
                ErrorCode::DuplicateContainer
            }
            AdminError::Validation(_) => ErrorCode::ValidationFailed,
            AdminError::NotFound(_) => ErrorCode::NotFound,
            AdminError::Store(_) => {
                warn!(error = %self, "[API] Admin store request failed");
                ErrorCode::StoreUnavailable
            }
            AdminError::Serialization(_) => ErrorCode::Internal,
        };
        ApiErrorResponse::with_code(code, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn refresh_acknowledgement_is_accepted_with_meta() {
        let resp = ApiResponse::accepted(serde_json::json!({"queued": true}));
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let v = body_json(resp).await;
        assert_eq!(v["data"]["queued"], true);
        assert_eq!(v["meta"]["version"], API_VERSION);
        assert!(v["meta"]["timestamp"].as_str().is_some_and(|t| t.contains('T')));
    }

    #[tokio::test]
    async fn duplicate_container_is_conflict() {
        let err = AdminError::Validation(ValidationError::DuplicateContainer("REEFER-1".into()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let v = body_json(resp).await;
        assert_eq!(v["error"]["code"], "DUPLICATE_CONTAINER");
        assert!(v["error"]["message"].as_str().unwrap().contains("REEFER-1"));
    }

    #[tokio::test]
    async fn missing_fields_are_validation_failures() {
        let err = AdminError::Validation(ValidationError::MissingFields(vec!["customer_email"]));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn store_outage_is_bad_gateway() {
        let err = AdminError::Store(StoreError::Backend("connection reset".into()));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await["error"]["code"], "STORE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn unknown_container_is_not_found() {
        let resp = AdminError::NotFound("Container 'C-9'".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_disabled_is_service_unavailable() {
        let resp = ApiErrorResponse::admin_disabled();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["error"]["code"], "ADMIN_DISABLED");
    }
}
