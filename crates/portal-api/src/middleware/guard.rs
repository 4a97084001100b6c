// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-route authorization guards.
//!
//! Both layers expect the [`AuthContext`] inserted by the auth layer. A
//! missing or anonymous context yields 401; an authenticated but
//! under-privileged role yields 403.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use portal_core::{Action, PermissionEvaluator, Resource, Role};
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// Requirement
// =============================================================================

#[derive(Debug, Clone)]
enum Requirement {
    AnyRole(Arc<Vec<Role>>),
    Permission {
        evaluator: PermissionEvaluator,
        resource: Resource,
        action: Action,
    },
}

impl Requirement {
    fn is_met(&self, ctx: &AuthContext) -> bool {
        match self {
            Requirement::AnyRole(roles) => ctx.has_any_role(roles),
            Requirement::Permission {
                evaluator,
                resource,
                action,
            } => ctx.can(evaluator, *resource, *action),
        }
    }

    fn describe(&self) -> String {
        match self {
            Requirement::AnyRole(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                format!("one of roles [{}]", names.join(", "))
            }
            Requirement::Permission {
                resource, action, ..
            } => format!("{}:{}", resource, action),
        }
    }
}

// =============================================================================
// Layers
// =============================================================================

/// Layer admitting only the listed roles.
#[derive(Debug, Clone)]
pub struct RequireRolesLayer {
    requirement: Requirement,
}

impl RequireRolesLayer {
    /// Creates a layer admitting any of `roles`.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            requirement: Requirement::AnyRole(Arc::new(roles.into_iter().collect())),
        }
    }
}

impl<S> Layer<S> for RequireRolesLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            requirement: self.requirement.clone(),
        }
    }
}

/// Layer admitting roles that hold `action` on `resource`.
#[derive(Debug, Clone)]
pub struct RequirePermissionLayer {
    requirement: Requirement,
}

impl RequirePermissionLayer {
    /// Creates a layer checking `resource:action` against `evaluator`.
    pub fn new(evaluator: PermissionEvaluator, resource: Resource, action: Action) -> Self {
        Self {
            requirement: Requirement::Permission {
                evaluator,
                resource,
                action,
            },
        }
    }
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            requirement: self.requirement.clone(),
        }
    }
}

// =============================================================================
// GuardMiddleware
// =============================================================================

/// Middleware enforcing a role or permission requirement.
#[derive(Debug, Clone)]
pub struct GuardMiddleware<S> {
    inner: S,
    requirement: Requirement,
}

impl<S> Service<Request<Body>> for GuardMiddleware<S>
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
        let requirement = self.requirement.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let auth_ctx = req
                .extensions()
                .get::<AuthContext>()
                .filter(|ctx| !ctx.is_anonymous())
                .cloned();

            match auth_ctx {
                Some(ctx) if requirement.is_met(&ctx) => inner.call(req).await,
                Some(ctx) => {
                    tracing::warn!(
                        user_id = %ctx.user_id,
                        role = ?ctx.role,
                        required = %requirement.describe(),
                        path = %req.uri().path(),
                        "Permission denied"
                    );
                    Ok(ApiError::forbidden("Insufficient permissions").into_response())
                }
                None => {
                    tracing::warn!("No auth context found, denying access");
                    Ok(ApiError::unauthorized("Authentication required").into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
