// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for the portal.
//!
//! Every section falls back to its defaults when omitted, so a minimal file
//! only needs the JWT secret:
//!
//! ```yaml
//! jwt:
//!   secret: "${PORTAL_JWT_SECRET}"
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_PORT: u16 = 8081;

/// Default token lifetime: 7 days.
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 604_800;

/// Default client session storage key.
pub const DEFAULT_SESSION_KEY: &str = "auth_state_v1";

/// Recommended minimum JWT secret length in bytes.
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Token signing settings.
    pub jwt: JwtSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Demo-user seeding.
    pub seed: SeedConfig,
    /// Audit trail settings.
    pub audit: AuditSettings,
    /// Client session persistence.
    pub session: SessionSettings,
}

impl PortalConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.jwt.validate()?;
        self.session.validate()?;
        Ok(())
    }

    /// Returns non-fatal findings worth reporting to an operator.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.jwt.secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            warnings.push(format!(
                "JWT secret is shorter than {} bytes",
                MIN_RECOMMENDED_SECRET_LEN
            ));
        }
        if self.seed.demo_users {
            warnings.push("Demo users are seeded with well-known passwords".to_string());
        }
        if self.server.allows_any_origin() {
            warnings.push("CORS allows any origin".to_string());
        }
        if !self.audit.enabled || self.audit.backend == AuditBackend::None {
            warnings.push("Audit trail is disabled".to_string());
        }

        warnings
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Prefix for every API route.
    pub base_path: String,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            base_path: "/api".to_string(),
            request_timeout_secs: 30,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Validates the server section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::validation(
                "server.base_path",
                "must be empty or start with '/'",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.cors_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ConfigError::validation(
                "server.cors_origins",
                "origins cannot be empty",
            ));
        }
        Ok(())
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

// =============================================================================
// JWT
// =============================================================================

/// Token signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    /// HS256 signing secret.
    #[serde(skip_serializing)]
    pub secret: Secret,
    /// `iss` claim.
    pub issuer: String,
    /// Token lifetime in seconds.
    pub expiration_secs: i64,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: Secret::default(),
            issuer: "portal".to_string(),
            expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            leeway_secs: 60,
        }
    }
}

impl JwtSettings {
    /// Validates the JWT section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.secret.is_empty() {
            return Err(ConfigError::missing_field("jwt.secret"));
        }
        if self.expiration_secs <= 0 {
            return Err(ConfigError::validation(
                "jwt.expiration_secs",
                "must be positive",
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation("jwt.issuer", "cannot be empty"));
        }
        Ok(())
    }
}

/// A secret string that never shows up in debug output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` for [`LogLevel::Warn`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines for log aggregation.
    Json,
    /// Compact single-line text.
    Compact,
}

// =============================================================================
// Seed
// =============================================================================

/// Demo-user seeding on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Insert the demo accounts that are missing.
    pub demo_users: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { demo_users: true }
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Whether security events are recorded at all.
    pub enabled: bool,
    /// Where events go.
    pub backend: AuditBackend,
    /// Record 403 responses as access-denied events.
    pub authorization_failures: bool,
    /// Entries kept by the `memory` backend before the oldest are dropped.
    pub memory_capacity: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: AuditBackend::Tracing,
            authorization_failures: true,
            memory_capacity: 10_000,
        }
    }
}

impl AuditSettings {
    /// Returns the backend in effect, [`AuditBackend::None`] when disabled.
    pub fn effective_backend(&self) -> AuditBackend {
        if self.enabled {
            self.backend
        } else {
            AuditBackend::None
        }
    }
}

/// Audit logger backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// Bounded in-process buffer.
    Memory,
    /// Structured log events.
    #[default]
    Tracing,
    /// Discard everything.
    None,
}

// =============================================================================
// Session
// =============================================================================

/// Client session persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Directory for file-backed session storage.
    pub storage_dir: PathBuf,
    /// Key the session is stored under.
    pub storage_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".portal/session"),
            storage_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl SessionSettings {
    /// Validates the session section.
    ///
    /// The key becomes a file name, so it is limited to ASCII letters,
    /// digits, `_` and `-`.
    pub fn validate(&self) -> ConfigResult<()> {
        let valid = !self.storage_key.is_empty()
            && self
                .storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ConfigError::validation(
                "session.storage_key",
                "must be non-empty and use only letters, digits, '_' or '-'",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.jwt.secret = Secret::new("a-secret-that-is-at-least-32-bytes-long");
        config
    }

    #[test]
    fn test_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.jwt.expiration_secs, 604_800);
        assert_eq!(config.session.storage_key, "auth_state_v1");
        assert_eq!(config.audit.backend, AuditBackend::Tracing);
        assert!(config.seed.demo_users);
    }

    #[test]
    fn test_secret_is_required() {
        let err = PortalConfig::default().validate().unwrap_err();
        assert_eq!(err.field(), Some("jwt.secret"));
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut config = valid_config();
        config.server.port = 0;
        assert_eq!(config.validate().unwrap_err().field(), Some("server.port"));

        let mut config = valid_config();
        config.server.base_path = "api".to_string();
        assert!(config.validate().is_err());

        config.server.base_path = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jwt_validation() {
        let mut config = valid_config();
        config.jwt.expiration_secs = 0;
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("jwt.expiration_secs")
        );
    }

    #[test]
    fn test_session_key_validation() {
        let mut config = valid_config();
        config.session.storage_key = "../auth".to_string();
        assert_eq!(
            config.validate().unwrap_err().field(),
            Some("session.storage_key")
        );
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let debug = format!("{:?}", valid_config().jwt);
        assert!(!debug.contains("at-least-32"));
        assert!(debug.contains("Secret(***)"));
    }

    #[test]
    fn test_effective_audit_backend() {
        let mut audit = AuditSettings::default();
        assert_eq!(audit.effective_backend(), AuditBackend::Tracing);
        audit.enabled = false;
        assert_eq!(audit.effective_backend(), AuditBackend::None);
    }

    #[test]
    fn test_warnings() {
        let mut config = valid_config();
        config.seed.demo_users = false;
        config.server.cors_origins = vec!["http://localhost:5173".to_string()];
        assert!(config.warnings().is_empty());

        config.jwt.secret = Secret::new("short");
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
