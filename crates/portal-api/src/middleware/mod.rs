// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AuthMiddleware`]: JWT authentication against the live user record
//! - [`RequireRolesLayer`] / [`RequirePermissionLayer`]: per-route guards
//! - [`AuditMiddleware`]: access-denied audit logging

mod auth;
pub mod audit;
mod guard;

pub use auth::{AuthLayer, AuthMiddleware};
pub use audit::{AuditLayer, AuditMiddleware};
pub use guard::{GuardMiddleware, RequirePermissionLayer, RequireRolesLayer};
