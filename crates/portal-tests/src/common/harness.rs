// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! An in-process API server driven through [`tower::ServiceExt::oneshot`].

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use portal_api::{ApiServerBuilder, TokenIssuer};
use portal_core::audit::InMemoryAuditLogger;
use portal_core::{InMemoryUserStore, User, UserStore};

use super::fixtures::{demo_users, test_api_config, test_issuer};
use super::mocks::MockUserStore;

// =============================================================================
// TestResponse
// =============================================================================

/// Status and decoded body of a response.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body, or `Value::Null` for an empty body.
    pub body: Value,
}

impl TestResponse {
    /// Returns the `error.code` field of an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// An API over an in-memory store and an in-memory audit log.
pub struct TestApp {
    router: Router,
    /// The backing user store.
    pub users: Arc<InMemoryUserStore>,
    /// The recorded audit trail.
    pub audit: Arc<InMemoryAuditLogger>,
    /// The issuer the server signs with.
    pub issuer: Arc<TokenIssuer>,
}

impl TestApp {
    /// Creates an app seeded with the demo accounts.
    pub fn new() -> Self {
        Self::with_users(demo_users())
    }

    /// Creates an app holding the demo accounts plus `extra`.
    pub fn with_extra_users(extra: impl IntoIterator<Item = User>) -> Self {
        let mut users = demo_users();
        users.extend(extra);
        Self::with_users(users)
    }

    /// Creates an app holding exactly `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Arc::new(InMemoryUserStore::with_users(users));
        Self::serving(store.clone(), store)
    }

    /// Creates an app that serves from `mock`. `users` reads the data
    /// behind it, bypassing injected failures.
    pub fn over_mock_store(mock: Arc<MockUserStore>) -> Self {
        let view = Arc::new(mock.inner().clone());
        Self::serving(mock, view)
    }

    fn serving(store: Arc<dyn UserStore>, view: Arc<InMemoryUserStore>) -> Self {
        let audit = Arc::new(InMemoryAuditLogger::new());
        let issuer = test_issuer();

        let server = ApiServerBuilder::new()
            .config(test_api_config())
            .issuer(issuer.clone())
            .users(store)
            .audit_logger(audit.clone())
            .build()
            .expect("Failed to build test server");

        Self {
            router: server.router(),
            users: view,
            audit,
            issuer,
        }
    }

    /// Sends a request and decodes the response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        TestResponse { status, body }
    }

    /// GET with an optional token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, token, None).await
    }

    /// PUT with a JSON body.
    pub async fn put(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }

    /// POST /api/auth/login.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Logs in and returns the token. Panics when the login fails.
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "login for {} failed: {}",
            email,
            response.body
        );
        response.body["token"]
            .as_str()
            .expect("login response has no token")
            .to_string()
    }

    /// Lets spawned audit writes run.
    pub async fn settle(&self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    /// Signs a token for a stored user without going through login.
    pub async fn token_for(&self, user_id: &str) -> String {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .expect("Store lookup failed")
            .unwrap_or_else(|| panic!("Unknown user {}", user_id));
        self.issuer
            .issue(&user)
            .expect("Failed to issue token")
            .token
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
