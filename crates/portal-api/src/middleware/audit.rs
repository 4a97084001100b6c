// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging middleware.
//!
//! Handlers audit their own domain events (login, user changes, role
//! changes). This layer covers what no handler sees: requests answered with
//! 403 by a route guard are recorded as access-denied events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use portal_core::audit::{AuditLog, AuditLogger, AuditResource, NoOpAuditLogger};
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::config::AuditConfig;

// =============================================================================
// AuditLayer
// =============================================================================

/// Layer recording authorization failures.
///
/// Must sit inside the auth layer so the [`AuthContext`] is available.
#[derive(Clone)]
pub struct AuditLayer {
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
}

impl AuditLayer {
    /// Creates a new audit layer.
    pub fn new(logger: Arc<dyn AuditLogger>, config: AuditConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }

    /// Creates an audit layer that records nothing.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoOpAuditLogger), AuditConfig::disabled())
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware {
            inner,
            logger: self.logger.clone(),
            config: self.config.clone(),
        }
    }
}

// =============================================================================
// AuditMiddleware
// =============================================================================

/// Middleware recording authorization failures.
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    logger: Arc<dyn AuditLogger>,
    config: Arc<AuditConfig>,
}

impl<S> AuditMiddleware<S> {
    fn records_denials(&self) -> bool {
        self.config.enabled && self.config.authorization_failures
    }
}

impl<S> Service<Request<Body>> for AuditMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let logger = self.logger.clone();
        let enabled = self.records_denials();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let auth_ctx = req.extensions().get::<AuthContext>().cloned();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            if enabled && response.status() == StatusCode::FORBIDDEN {
                if let Some(entry) = denial_entry(auth_ctx.as_ref(), method.as_str(), &path) {
                    tokio::spawn(async move {
                        if let Err(e) = logger.log(entry).await {
                            tracing::warn!(error = %e, "Failed to write audit log");
                        }
                    });
                }
            }

            Ok(response)
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds the access-denied entry for an authenticated caller.
///
/// Anonymous callers never reach a 403, so `None` is returned for them.
fn denial_entry(auth_ctx: Option<&AuthContext>, method: &str, path: &str) -> Option<AuditLog> {
    let ctx = auth_ctx.filter(|ctx| !ctx.is_anonymous())?;
    let role = ctx.role.map(|r| r.as_str()).unwrap_or("NONE");

    Some(
        AuditLog::access_denied(
            AuditResource::api(path),
            &ctx.user_id,
            ctx.client_ip,
            format!("{} {} not permitted for role {}", method, path, role),
        )
        .with_correlation_id(ctx.request_id),
    )
}

// =============================================================================
// Tests
// =============================================================================
