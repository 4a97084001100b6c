// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-api
//!
//! REST API server for the project portal.
//!
//! This crate provides the HTTP surface over `portal-core`: JWT issuance
//! and validation, the authentication layer, per-route role and permission
//! guards, and the user administration endpoints.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{AuthContext, Claims, IssuedToken, JwtConfig, TokenIssuer};
pub use config::{ApiConfig, AuditConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use middleware::{AuditLayer, AuthLayer, RequirePermissionLayer, RequireRolesLayer};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
