// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use portal_core::{Role, UserSummary};
use serde::{Deserialize, Serialize};

use crate::auth::IssuedToken;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful.
    pub success: bool,
    /// Response data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    status: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            status: None,
        }
    }

    /// Creates a 201 response with data.
    pub fn created(data: T) -> Self {
        Self {
            status: Some(StatusCode::CREATED.as_u16()),
            ..Self::success(data)
        }
    }

    /// Adds a message to the response.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::OK)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy(uptime_secs: u64) -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
            uptime_secs,
            timestamp: Utc::now(),
        }
    }
}

/// Authentication response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Access token.
    pub token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Expires in seconds.
    pub expires_in: i64,
    /// The authenticated user.
    pub user: UserSummary,
}

impl AuthResponse {
    /// Creates a new auth response.
    pub fn new(issued: IssuedToken, user: UserSummary) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user,
        }
    }
}

/// User list response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    /// Users, newest first.
    pub users: Vec<UserSummary>,
    /// Number of users returned.
    pub total: usize,
}

impl UserListResponse {
    /// Creates a list response.
    pub fn new(users: Vec<UserSummary>) -> Self {
        let total = users.len();
        Self { users, total }
    }
}

/// Role change response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleChangeResponse {
    /// The updated user.
    pub user: UserSummary,
    /// The role before the change.
    pub previous_role: Role,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_api_response_created() {
        let response = ApiResponse::created("u_1").with_message("User created");
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.message.as_deref(), Some("User created"));
    }

    #[test]
    fn test_user_list_total() {
        let list = UserListResponse::new(Vec::new());
        assert_eq!(list.total, 0);
    }

    #[test]
    fn test_health_response() {
        let health = HealthResponse::healthy(5);
        assert_eq!(health.status, "ok");
        assert_eq!(health.uptime_secs, 5);

        let value = serde_json::to_value(&health).unwrap();
        assert!(value.get("timestamp").is_some());
    }
}
