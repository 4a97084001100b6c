// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! Configuration files driving the API and the session store:
//!
//! - Parsing (YAML, TOML, JSON)
//! - Placeholders and environment overrides
//! - Path resolution
//! - Config to server wiring
//!
//! ## Test Categories
//!
//! - `test_config_*`: Loading and validation tests
//! - `test_wiring_*`: Loaded configuration used by other crates

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use portal_api::ApiServerBuilder;
use portal_config::{
    AuditBackend, ConfigError, ConfigFormat, ConfigLoader, LogLevel, DEFAULT_JWT_EXPIRATION_SECS,
};
use portal_core::{InMemoryUserStore, Role};
use portal_session::{FileStorage, Session, SessionStorage};
use portal_tests::common::*;

// =============================================================================
// Helpers
// =============================================================================

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write config");
    file
}

fn loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::new().with_env_prefix(prefix)
}

const FULL_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9090
  base_path: "/api"
  cors_origins:
    - "http://localhost:5173"
jwt:
  secret: "portal-integration-secret-with-enough-length"
  expiration_secs: 3600
logging:
  level: debug
  format: json
seed:
  demo_users: false
audit:
  backend: memory
session:
  storage_dir: "sessions"
"#;

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_config_full_yaml() {
    init_test_logging();
    let file = write_config(".yaml", FULL_YAML);

    let config = loader("PORTAL_IT_FULL").load(file.path()).unwrap();

    assert_eq!(config.server.port, 9090);
    assert!(!config.server.allows_any_origin());
    assert_eq!(config.jwt.expiration_secs, 3600);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(!config.seed.demo_users);
    assert_eq!(config.audit.effective_backend(), AuditBackend::Memory);
    assert!(config.warnings().is_empty());
}

#[test]
fn test_config_minimal_defaults() {
    let config = loader("PORTAL_IT_MIN")
        .load_from_str(&minimal_yaml_config(), ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.server.port, 8081);
    assert_eq!(config.jwt.expiration_secs, DEFAULT_JWT_EXPIRATION_SECS);
    assert_eq!(config.jwt.expiration_secs, SEVEN_DAYS_SECS);
    assert_eq!(config.session.storage_key, "auth_state_v1");
    assert!(config.seed.demo_users);
}

#[test]
fn test_config_formats_agree() {
    let toml = format!("[jwt]\nsecret = \"{}\"\n\n[server]\nport = 7000\n", TEST_JWT_SECRET);
    let json = format!(
        r#"{{"jwt": {{"secret": "{}"}}, "server": {{"port": 7000}}}}"#,
        TEST_JWT_SECRET
    );

    let from_toml = loader("PORTAL_IT_FMT")
        .load(write_config(".toml", &toml).path())
        .unwrap();
    let from_json = loader("PORTAL_IT_FMT")
        .load(write_config(".json", &json).path())
        .unwrap();

    assert_eq!(from_toml.server.port, 7000);
    assert_eq!(from_json.server.port, 7000);
    assert_eq!(from_toml.jwt.secret.expose(), from_json.jwt.secret.expose());
}

#[test]
fn test_config_missing_secret_is_rejected() {
    let err = loader("PORTAL_IT_NOSECRET")
        .load_from_str("server:\n  port: 8081\n", ConfigFormat::Yaml)
        .unwrap_err();

    assert_eq!(err.field(), Some("jwt.secret"));
}

#[test]
fn test_config_unknown_section_is_rejected() {
    let content = format!("{}metrics:\n  enabled: true\n", minimal_yaml_config());
    let file = write_config(".yaml", &content);

    let err = loader("PORTAL_IT_UNKNOWN").load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_config_placeholder_and_override() {
    std::env::set_var("PORTAL_IT_PLACEHOLDER_SECRET", TEST_JWT_SECRET);
    std::env::set_var("PORTAL_IT_OVR_SERVER_PORT", "9191");

    let content = "jwt:\n  secret: \"${PORTAL_IT_PLACEHOLDER_SECRET}\"\nserver:\n  port: ${PORTAL_IT_PORT_UNSET:8000}\n";
    let config = loader("PORTAL_IT_OVR")
        .load_from_str(content, ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.jwt.secret.expose(), TEST_JWT_SECRET);
    assert_eq!(config.server.port, 9191);

    std::env::remove_var("PORTAL_IT_PLACEHOLDER_SECRET");
    std::env::remove_var("PORTAL_IT_OVR_SERVER_PORT");
}

#[test]
fn test_config_secret_is_never_serialized() {
    let config = loader("PORTAL_IT_SER")
        .load_from_str(&minimal_yaml_config(), ConfigFormat::Yaml)
        .unwrap();

    let rendered = serde_json::to_string(&config).unwrap();
    assert!(!rendered.contains(TEST_JWT_SECRET));
    assert!(!format!("{:?}", config).contains(TEST_JWT_SECRET));
}

// =============================================================================
// Wiring
// =============================================================================

#[tokio::test]
async fn test_wiring_config_drives_token_lifetime() {
    let file = write_config(".yaml", FULL_YAML);
    let config = loader("PORTAL_IT_WIRE").load(file.path()).unwrap();

    let server = ApiServerBuilder::new()
        .config(portal_bin::api_config(&config))
        .users(Arc::new(InMemoryUserStore::with_users(demo_users())))
        .build()
        .unwrap();
    assert_eq!(server.addr().port(), 9090);

    let issuer = server.state().issuer();
    assert_eq!(issuer.expiration_secs(), 3600);

    let user = demo(Role::Developer).to_user().unwrap();
    let token = issuer.issue(&user).unwrap();
    let claims = issuer.validate(&token.token).unwrap();
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_wiring_session_dir_is_relative_to_config() {
    let dir = temp_test_dir("portal_config");
    let path = dir.path().join("portal.yaml");
    std::fs::write(&path, FULL_YAML).unwrap();

    let config = loader("PORTAL_IT_SESSION").load(&path).unwrap();
    assert_eq!(config.session.storage_dir, dir.path().join("sessions"));

    let storage = Arc::new(FileStorage::new(&config.session.storage_dir));
    let mut session = Session::new(storage.clone()).with_key(config.session.storage_key.clone());
    session.restore().await;
    session
        .login(
            demo(Role::Manager).to_user().unwrap().summary(),
            "header.payload.signature",
        )
        .await
        .unwrap();

    assert!(storage.get(&config.session.storage_key).await.unwrap().is_some());
    assert!(config.session.storage_dir.join("auth_state_v1.json").exists());
}

#[test]
fn test_wiring_disabled_audit_backend() {
    let content = format!("{}audit:\n  backend: none\n", minimal_yaml_config());
    let config = loader("PORTAL_IT_AUDIT")
        .load_from_str(&content, ConfigFormat::Yaml)
        .unwrap();

    let api = portal_bin::api_config(&config);
    assert!(!api.audit.enabled);
    assert!(config
        .warnings()
        .iter()
        .any(|w| w.contains("Audit trail is disabled")));
}
