// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Portal Integration Tests
//!
//! Cross-crate tests for the portal access-control stack, together with the
//! fixtures, mocks and harness they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Demo users, secrets and configurations
//!   - `assertions`: Response and audit assertion helpers
//!   - `mocks`: Failing storage backends for error injection
//!   - `harness`: An in-process API with helpers for requests and logins
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p portal-tests
//!
//! # Run a specific suite
//! cargo test -p portal-tests --test integration_core
//! cargo test -p portal-tests --test integration_api
//! cargo test -p portal-tests --test integration_session
//! cargo test -p portal-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Core Tests (`integration_core.rs`)
//! - Role hierarchy and permission checks
//! - Credential verification and legacy migration
//! - Role administration
//!
//! ### API Tests (`integration_api.rs`)
//! - Login and token claims
//! - Route guards and error bodies
//! - Audit trail of denials
//!
//! ### Session Tests (`integration_session.rs`)
//! - Restore from storage, including corrupt data
//! - Navigation guards per role
//!
//! ### Config Tests (`integration_config.rs`)
//! - File loading, placeholders and environment overrides

pub mod common;

/// Common imports for test files.
pub mod prelude {
    pub use crate::common::*;
    pub use portal_api::{ApiConfig, ApiServerBuilder, JwtConfig, TokenIssuer};
    pub use portal_core::audit::{AuditAction, InMemoryAuditLogger};
    pub use portal_core::{
        InMemoryUserStore, PermissionEvaluator, Role, RoleRegistry, User, UserStore,
    };
    pub use portal_session::{GuardOutcome, MemoryStorage, Route, RouteTable, Session};
}
