// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings consumed by [`ApiServer`](crate::ApiServer).
//!
//! The binary builds an [`ApiConfig`] from the portal configuration file;
//! tests usually start from `ApiConfig::default().with_jwt(..)`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::JwtConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8081;

// =============================================================================
// ApiConfig
// =============================================================================

/// Listener, routing and security settings of the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Prefix of every route, `/api` unless overridden.
    pub base_path: String,
    /// Cross-origin policy.
    pub cors: CorsConfig,
    /// Token signing and lifetime.
    pub jwt: JwtConfig,
    /// HTTP-level audit switches.
    pub audit: AuditConfig,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            base_path: "/api".to_string(),
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            audit: AuditConfig::default(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        (self.host, self.port).into()
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Replaces the token settings.
    pub fn with_jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = jwt;
        self
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// Origins and methods the browser client may use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin and disables credentials.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Send `Access-Control-Allow-Credentials`.
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    /// Allows only `origins`, with credentials.
    pub fn strict(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            allow_credentials: true,
            ..Self::default()
        }
    }

    /// Returns `true` when the origin list contains `*`.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

// =============================================================================
// AuditConfig
// =============================================================================

/// What the HTTP layer records in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Master switch for handler-level events (logins, role changes).
    pub enabled: bool,
    /// Record 403 responses as access-denied events.
    pub authorization_failures: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authorization_failures: true,
        }
    }
}

impl AuditConfig {
    /// Records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            authorization_failures: false,
        }
    }
}
