// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-config
//!
//! Configuration management for the project portal.
//!
//! ## Quick Start
//!
//! ```no_run
//! use portal_config::load_config;
//!
//! let config = load_config("portal.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - bind address, port, base path, timeout, CORS origins
//! - `jwt` - signing secret, issuer, token lifetime, leeway
//! - `logging` - level and format
//! - `seed` - demo-user seeding on startup
//! - `audit` - audit trail backend
//! - `session` - client session storage directory and key
//!
//! ## Environment Variables
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! jwt:
//!   secret: "${PORTAL_SECRET:change-me}"
//! ```
//!
//! A few settings can be overridden directly:
//!
//! ```text
//! PORTAL_SERVER_PORT=9090
//! PORTAL_JWT_SECRET=...
//! PORTAL_JWT_EXPIRATION_SECS=3600
//! PORTAL_LOG_LEVEL=debug
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, resolve_env_placeholders, ConfigFormat, ConfigLoader};
pub use schema::{
    AuditBackend, AuditSettings, JwtSettings, LogFormat, LogLevel, LoggingConfig, PortalConfig,
    Secret, SeedConfig, ServerConfig, SessionSettings, DEFAULT_JWT_EXPIRATION_SECS, DEFAULT_PORT,
    DEFAULT_SESSION_KEY,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
