// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HTTP errors.
//!
//! Handlers and middleware return [`ApiError`]; its `IntoResponse` renders
//! the status and the body `{"error": {"code", "message", "details?"}}`.
//! Messages for 5xx responses are replaced by a generic text so internal
//! causes only reach the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for handlers and middleware.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400, malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 400, well-formed but invalid input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 401, missing, invalid or stale credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403, authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404, names the missing thing.
    #[error("{0} not found")]
    NotFound(String),

    /// 409, the request contradicts current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 503, a backing store failed. Safe to retry.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 500.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a 400 for a malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates a 400 for invalid input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a 401.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// The single 401 used for every failed login, whatever the cause.
    pub fn invalid_credentials() -> Self {
        Self::unauthorized("Invalid credentials")
    }

    /// Creates a 403.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a 404.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates a 409.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a 500.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status of the response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `error.code`.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text placed in `error.message`.
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest(message)
            | Self::Validation(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::Conflict(message) => message.clone(),
            Self::NotFound(_) => self.to_string(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable, please retry".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let details = matches!(self, Self::ServiceUnavailable(_))
            .then(|| serde_json::json!({ "retryable": true }));
        let body = ErrorBody {
            error: ErrorPayload {
                code,
                message: self.client_message(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message } => Self::Validation(message),
            CoreError::InvalidCredentials => Self::invalid_credentials(),
            CoreError::Forbidden { message } => Self::Forbidden(message),
            CoreError::NotFound { resource } => Self::NotFound(resource),
            CoreError::Conflict { message } => Self::Conflict(message),
            CoreError::UnknownRole { value } => Self::Validation(format!("Unknown role: {}", value)),
            CoreError::Storage { message } => Self::ServiceUnavailable(message),
            CoreError::Hashing { message } => Self::Internal(message),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("Invalid JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (CoreError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (CoreError::InvalidCredentials, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (CoreError::forbidden("x"), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (CoreError::not_found("x"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (CoreError::conflict("x"), StatusCode::CONFLICT, "CONFLICT"),
            (CoreError::unknown_role("ROOT"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (CoreError::storage("x"), StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            (CoreError::hashing("x"), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (core, status, code) in cases {
            let api = ApiError::from(core);
            assert_eq!(api.status_code(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[test]
    fn test_invalid_credentials_message_is_uniform() {
        let err = ApiError::from(CoreError::InvalidCredentials);
        assert_eq!(err.client_message(), "Invalid credentials");
    }

    #[test]
    fn test_server_error_messages_are_generic() {
        assert!(!ApiError::internal("secret key missing").client_message().contains("secret"));
        let unavailable = ApiError::from(CoreError::storage("disk full"));
        assert!(!unavailable.client_message().contains("disk"));
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = ApiError::not_found("User u_x").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "User u_x not found");
        assert!(body["error"].get("details").is_none());
    }
}
