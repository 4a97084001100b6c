// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and resolve `${VAR}` / `${VAR:default}` placeholders
//! 2. Parse YAML, TOML or JSON, chosen by file extension
//! 3. Apply `PORTAL_*` environment overrides
//! 4. Resolve the session directory against the config file's directory
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! PORTAL_SERVER_PORT=9090
//! PORTAL_JWT_SECRET=...
//! PORTAL_JWT_EXPIRATION_SECS=3600
//! PORTAL_LOG_LEVEL=debug
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{LogLevel, PortalConfig, Secret};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// ```no_run
/// use portal_config::ConfigLoader;
///
/// let config = ConfigLoader::new().load("portal.yaml").unwrap();
/// println!("port {}", config.server.port);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for relative paths; defaults to the file's directory.
    base_path: Option<PathBuf>,
    /// Environment variable prefix.
    env_prefix: String,
    /// Whether placeholders and overrides are applied.
    resolve_env_vars: bool,
    /// Whether relative paths are resolved.
    resolve_paths: bool,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "PORTAL".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
        }
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format is chosen by extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<PortalConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self.parse_content(&content, format, path)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }
        if self.resolve_paths && config.session.storage_dir.is_relative() {
            config.session.storage_dir = base_path.join(&config.session.storage_dir);
        }

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!(
            port = config.server.port,
            base_path = %config.server.base_path,
            audit = ?config.audit.effective_backend(),
            "Effective configuration"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<PortalConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        let mut config: PortalConfig = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;

        Ok(config)
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<PortalConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    fn env_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    /// Applies `<PREFIX>_*` environment overrides.
    fn apply_env_overrides(&self, config: &mut PortalConfig) -> ConfigResult<()> {
        let name = self.env_name("SERVER_PORT");
        if let Ok(value) = env::var(&name) {
            config.server.port = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(&name, "expected valid port number"))?;
        }

        if let Ok(value) = env::var(self.env_name("JWT_SECRET")) {
            config.jwt.secret = Secret::new(value);
        }

        let name = self.env_name("JWT_EXPIRATION_SECS");
        if let Ok(value) = env::var(&name) {
            config.jwt.expiration_secs = value
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(&name, "expected a number of seconds"))?;
        }

        let name = self.env_name("LOG_LEVEL");
        if let Ok(value) = env::var(&name) {
            match LogLevel::parse(&value) {
                Some(level) => config.logging.level = level,
                None => warn!("Ignoring {}={}: unknown log level", name, value),
            }
        }

        if let Ok(value) = env::var(self.env_name("SEED_DEMO_USERS")) {
            config.seed.demo_users = parse_bool(&value);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => Ok(toml::from_str(content)?),
        ConfigFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

/// YAML goes through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Resolves `${VAR}` and `${VAR:default}` placeholders.
///
/// An unset variable without a default keeps its placeholder text; an
/// unterminated placeholder is copied through unchanged.
pub fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<PortalConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<PortalConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AuditBackend, LogFormat};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
server:
  port: 9000
  base_path: /portal/api
  cors_origins:
    - http://localhost:5173

jwt:
  secret: yaml-secret-that-is-at-least-32-bytes
  issuer: portal-test

logging:
  level: debug
  format: json

seed:
  demo_users: false

audit:
  backend: memory

session:
  storage_dir: sessions
"#;

    fn isolated_loader(prefix: &str) -> ConfigLoader {
        ConfigLoader::new().with_env_prefix(prefix)
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = isolated_loader("PORTAL_TEST_YAML").load(file.path()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.base_path, "/portal/api");
        assert!(!config.server.allows_any_origin());
        assert_eq!(config.jwt.issuer, "portal-test");
        assert_eq!(config.jwt.expiration_secs, 604_800);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.seed.demo_users);
        assert_eq!(config.audit.backend, AuditBackend::Memory);

        let dir = file.path().parent().unwrap();
        assert_eq!(config.session.storage_dir, dir.join("sessions"));
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[server]
port = 8090

[jwt]
secret = "toml-secret-that-is-at-least-32-bytes"
expiration_secs = 3600
"#;
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = isolated_loader("PORTAL_TEST_TOML").load(file.path()).unwrap();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.jwt.expiration_secs, 3600);
        assert_eq!(config.server.base_path, "/api");
    }

    #[test]
    fn test_load_json_from_str() {
        let json = r#"{"jwt": {"secret": "json-secret"}, "audit": {"enabled": false}}"#;
        let config = isolated_loader("PORTAL_TEST_JSON")
            .load_from_str(json, ConfigFormat::Json)
            .unwrap();

        assert_eq!(config.jwt.secret.expose(), "json-secret");
        assert_eq!(config.audit.effective_backend(), AuditBackend::None);
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let json = r#"{"jwt": {"secret": "s"}, "database": {}}"#;
        let result = isolated_loader("PORTAL_TEST_UNKNOWN").load_from_str(json, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Serialization { .. })));
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let result = isolated_loader("PORTAL_TEST_NOSECRET").load_from_str("{}", ConfigFormat::Json);
        assert!(result.unwrap_err().is_validation_error());
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("portal.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("portal.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("portal.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("portal")).is_err());
    }

    #[test]
    fn test_env_placeholder_resolution() {
        env::set_var("PORTAL_TEST_PLACEHOLDER_HOST", "db.internal");

        assert_eq!(
            resolve_env_placeholders("host: ${PORTAL_TEST_PLACEHOLDER_HOST}"),
            "host: db.internal"
        );
        assert_eq!(
            resolve_env_placeholders("port: ${PORTAL_TEST_PLACEHOLDER_UNSET:8081}"),
            "port: 8081"
        );
        assert_eq!(
            resolve_env_placeholders("x: ${PORTAL_TEST_PLACEHOLDER_UNSET}"),
            "x: ${PORTAL_TEST_PLACEHOLDER_UNSET}"
        );
        assert_eq!(resolve_env_placeholders("x: ${open"), "x: ${open");
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("PORTAL_TEST_OVR_SERVER_PORT", "7000");
        env::set_var("PORTAL_TEST_OVR_JWT_SECRET", "from-environment");
        env::set_var("PORTAL_TEST_OVR_JWT_EXPIRATION_SECS", "120");
        env::set_var("PORTAL_TEST_OVR_LOG_LEVEL", "warning");

        let config = isolated_loader("PORTAL_TEST_OVR")
            .load_from_str("{}", ConfigFormat::Json)
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.jwt.secret.expose(), "from-environment");
        assert_eq!(config.jwt.expiration_secs, 120);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_env_override() {
        env::set_var("PORTAL_TEST_BADPORT_SERVER_PORT", "not-a-port");
        env::set_var("PORTAL_TEST_BADPORT_JWT_SECRET", "s");

        let result = isolated_loader("PORTAL_TEST_BADPORT").load_from_str("{}", ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_file_not_found() {
        let result = ConfigLoader::new().load("/nonexistent/portal.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = isolated_loader("PORTAL_TEST_PARSE").load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("ON"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }
}
