// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;

use portal_core::{Action, Actor, PermissionEvaluator, Resource, Role, User};
use serde::Serialize;
use uuid::Uuid;

use super::Claims;

/// Authentication context for a request.
///
/// Attached to requests by the auth layer. The role is the one currently
/// stored for the user, which may differ from the role in the token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// User ID.
    pub user_id: String,
    /// Current role; `None` for anonymous requests.
    pub role: Option<Role>,
    /// User's email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User's display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// Token ID, if the token carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl AuthContext {
    /// Creates a context from the live user record and the validated claims.
    pub fn from_user(user: &User, claims: &Claims) -> Self {
        Self {
            user_id: user.id.clone(),
            role: Some(user.role),
            email: Some(user.email.clone()),
            name: Some(user.name.clone()),
            client_ip: None,
            request_id: Uuid::now_v7(),
            token_id: claims.jti.clone(),
        }
    }

    /// Creates an anonymous context (for unauthenticated requests).
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            role: None,
            email: None,
            name: None,
            client_ip: None,
            request_id: Uuid::now_v7(),
            token_id: None,
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// Returns `true` if the context has any of the given roles.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns `true` if the role grants `action` on `resource`.
    pub fn can(&self, evaluator: &PermissionEvaluator, resource: Resource, action: Action) -> bool {
        evaluator.has_permission(self.role, resource, action)
    }

    /// Returns `true` if this is an anonymous context.
    pub fn is_anonymous(&self) -> bool {
        self.role.is_none()
    }

    /// Returns the context as an administrative actor.
    pub fn actor(&self) -> Option<Actor> {
        self.role.map(|role| Actor::new(self.user_id.clone(), role))
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

// =============================================================================
// Tests
// =============================================================================
