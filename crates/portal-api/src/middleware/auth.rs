// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT authentication middleware.
//!
//! A valid token is necessary but not sufficient: the user it names is
//! re-read from the store on every request. A deleted or deactivated user is
//! rejected, and the stored role replaces the role in the token.

use std::collections::HashSet;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request},
    response::{IntoResponse, Response},
};
use portal_core::UserStore;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, TokenIssuer};
use crate::error::ApiError;

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for JWT authentication.
///
/// Requests to public paths pass with an anonymous context. Every other
/// request needs `Authorization: Bearer <token>`, otherwise it is answered
/// with 401 before reaching a handler.
#[derive(Clone)]
pub struct AuthLayer {
    issuer: Arc<TokenIssuer>,
    users: Arc<dyn UserStore>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(issuer: Arc<TokenIssuer>, users: Arc<dyn UserStore>) -> Self {
        Self {
            issuer,
            users,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Sets the paths that don't require authentication.
    ///
    /// A trailing `*` matches any path with that prefix.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = Arc::new(paths.into_iter().collect());
        self
    }

    /// Uses the default public paths under `base_path`.
    pub fn with_default_public_paths(self, base_path: &str) -> Self {
        let base = base_path.trim_end_matches('/');
        self.with_public_paths(vec![
            format!("{}/health", base),
            format!("{}/auth/login", base),
        ])
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            issuer: self.issuer.clone(),
            users: self.users.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for JWT authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    issuer: Arc<TokenIssuer>,
    users: Arc<dyn UserStore>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    /// Checks if a path is public.
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }

        self.public_paths.iter().any(|public| {
            public
                .strip_suffix('*')
                .is_some_and(|prefix| path.starts_with(prefix))
        })
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let issuer = self.issuer.clone();
        let users = self.users.clone();
        let is_public = *req.method() == Method::OPTIONS || self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let request_id = Uuid::now_v7();
            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            if is_public {
                let mut auth_ctx = AuthContext::anonymous().with_request_id(request_id);
                if let Some(ip) = client_ip {
                    auth_ctx = auth_ctx.with_client_ip(ip);
                }
                req.extensions_mut().insert(auth_ctx);
                return inner.call(req).await;
            }

            let Some(token) = extract_bearer_token(&req) else {
                tracing::debug!("No authorization token provided");
                return Ok(ApiError::unauthorized("No authorization token provided").into_response());
            };

            let claims = match issuer.validate(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!(error = %e, "Token validation failed");
                    return Ok(e.into_response());
                }
            };

            let user = match users.find_by_id(&claims.sub).await {
                Ok(Some(user)) if user.is_active => user,
                Ok(_) => {
                    tracing::debug!(user_id = %claims.sub, "Token subject is missing or inactive");
                    return Ok(ApiError::unauthorized("Account is not active").into_response());
                }
                Err(e) => return Ok(ApiError::from(e).into_response()),
            };

            if user.role != claims.role {
                tracing::debug!(
                    user_id = %user.id,
                    token_role = %claims.role,
                    current_role = %user.role,
                    "Role changed since token issuance"
                );
            }

            let mut auth_ctx = AuthContext::from_user(&user, &claims).with_request_id(request_id);
            if let Some(ip) = client_ip {
                auth_ctx = auth_ctx.with_client_ip(ip);
            }
            req.extensions_mut().insert(auth_ctx);

            inner.call(req).await
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::http::{HeaderValue, StatusCode};
    use portal_core::{InMemoryUserStore, Role, User};
    use std::convert::Infallible;
    use tower::ServiceExt;

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(JwtConfig::new("test-secret-key-that-is-long-enough-for-testing")).unwrap())
    }

    fn echo_role() -> impl Service<
        Request<Body>,
        Response = Response,
        Error = Infallible,
        Future = impl Future<Output = Result<Response, Infallible>> + Send,
    > + Clone
           + Send {
        tower::service_fn(|req: Request<Body>| async move {
            let role = req
                .extensions()
                .get::<AuthContext>()
                .and_then(|ctx| ctx.role)
                .map(|r| r.as_str())
                .unwrap_or("ANONYMOUS");
            Ok::<_, Infallible>(Response::new(Body::from(role)))
        })
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(path).body(Body::empty()).unwrap();
        if let Some(token) = token {
            req.headers_mut().insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }
        req
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_bearer_token(&req).is_none());

        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&req).is_none());

        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&req).is_none());

        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer mytoken123"));
        assert_eq!(extract_bearer_token(&req), Some("mytoken123".to_string()));
    }

    #[test]
    fn test_public_paths() {
        let layer = AuthLayer::new(issuer(), Arc::new(InMemoryUserStore::new()))
            .with_public_paths(vec!["/api/health".to_string(), "/static/*".to_string()]);
        let middleware = layer.layer(echo_role());

        assert!(middleware.is_public_path("/api/health"));
        assert!(middleware.is_public_path("/static/app.js"));
        assert!(!middleware.is_public_path("/api/users"));
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let layer = AuthLayer::new(issuer(), Arc::new(InMemoryUserStore::new()))
            .with_default_public_paths("/api");
        let service = layer.layer(echo_role());

        let response = service.oneshot(request("/api/users", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_path_is_anonymous() {
        let layer = AuthLayer::new(issuer(), Arc::new(InMemoryUserStore::new()))
            .with_default_public_paths("/api");
        let service = layer.layer(echo_role());

        let response = service.oneshot(request("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ANONYMOUS");
    }

    #[tokio::test]
    async fn test_live_role_replaces_token_role() {
        let issuer = issuer();
        let user = User::new("Dev", "dev@portal.test", "x", Role::Developer).with_id("u_dev");
        let store = Arc::new(InMemoryUserStore::with_users([user.clone()]));
        let token = issuer.issue(&user).unwrap().token;

        store.set_role("u_dev", Role::Manager).await.unwrap();

        let service = AuthLayer::new(issuer, store).layer(echo_role());
        let response = service.oneshot(request("/api/users", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "MANAGER");
    }

    #[tokio::test]
    async fn test_deactivated_user_is_rejected() {
        let issuer = issuer();
        let user = User::new("Dev", "dev@portal.test", "x", Role::Developer).with_id("u_dev");
        let store = Arc::new(InMemoryUserStore::with_users([user.clone().with_active(false)]));
        let token = issuer.issue(&user).unwrap().token;

        let service = AuthLayer::new(issuer, store).layer(echo_role());
        let response = service.oneshot(request("/api/users", Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let service = AuthLayer::new(issuer(), Arc::new(InMemoryUserStore::new())).layer(echo_role());
        let response = service
            .oneshot(request("/api/users", Some("not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
