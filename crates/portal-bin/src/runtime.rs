// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Wires the loaded configuration into the API server:
//!
//! - audit logger selection
//! - user store and optional demo-user seeding
//! - API server with graceful shutdown

use std::sync::Arc;

use portal_api::{ApiConfig, ApiServerBuilder, AuditConfig, CorsConfig, JwtConfig};
use portal_config::{AuditBackend, PortalConfig};
use portal_core::audit::{
    AuditLog, AuditLogger, InMemoryAuditLogger, NoOpAuditLogger, TracingAuditLogger,
};
use portal_core::{seed_demo_users, InMemoryUserStore, UserStore};
use tracing::{info, warn};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// PortalRuntime
// =============================================================================

/// Runs the API server until shutdown is signaled.
pub struct PortalRuntime {
    config: Arc<PortalConfig>,
    shutdown: ShutdownCoordinator,
    users: Arc<dyn UserStore>,
}

impl PortalRuntime {
    /// Creates a runtime over an empty in-memory user store.
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            users: Arc::new(InMemoryUserStore::new()),
        }
    }

    /// Uses `users` instead of a fresh in-memory store.
    pub fn with_users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Runs the server until an OS signal or a manual shutdown.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting portal API v{}", portal_core::VERSION);

        let audit_logger = create_audit_logger(&self.config);

        if self.config.seed.demo_users {
            let report = seed_demo_users(self.users.as_ref()).await?;
            if report.created > 0 {
                warn!(
                    created = report.created,
                    "Demo users seeded with well-known passwords"
                );
            }
        }

        let server = ApiServerBuilder::new()
            .config(api_config(&self.config))
            .users(self.users.clone())
            .audit_logger(audit_logger.clone())
            .build()
            .map_err(|e| BinError::from(e).with_context("Failed to build API server"))?;

        if let Err(e) = audit_logger.log(AuditLog::system_start(portal_core::VERSION)).await {
            warn!("Failed to log startup event: {}", e);
        }

        let signal = self.shutdown.shutdown_signal();
        let watcher = {
            let coordinator = self.shutdown.clone();
            tokio::spawn(async move { coordinator.wait_for_shutdown().await })
        };

        info!("Portal API is ready on {}", server.addr());
        let result = server.run_with_shutdown(signal).await;
        watcher.abort();

        if let Err(e) = audit_logger.log(AuditLog::system_shutdown()).await {
            warn!("Failed to log shutdown event: {}", e);
        }
        if let Err(e) = audit_logger.flush().await {
            warn!("Failed to flush audit log: {}", e);
        }

        info!("Portal API shutdown complete");
        result.map_err(BinError::from)
    }
}

/// Creates the audit logger selected by configuration.
pub fn create_audit_logger(config: &PortalConfig) -> Arc<dyn AuditLogger> {
    match config.audit.effective_backend() {
        AuditBackend::Memory => {
            info!(capacity = config.audit.memory_capacity, "Audit logging to memory");
            Arc::new(InMemoryAuditLogger::bounded(config.audit.memory_capacity))
        }
        AuditBackend::Tracing => {
            info!("Audit logging to tracing");
            Arc::new(TracingAuditLogger::new())
        }
        AuditBackend::None => {
            info!("Audit logging disabled");
            Arc::new(NoOpAuditLogger)
        }
    }
}

/// Maps the file configuration onto the API server configuration.
pub fn api_config(config: &PortalConfig) -> ApiConfig {
    let server = &config.server;

    let cors = if server.allows_any_origin() {
        CorsConfig::default()
    } else {
        CorsConfig::strict(server.cors_origins.clone())
    };

    let jwt = JwtConfig {
        secret: config.jwt.secret.expose().to_string(),
        issuer: config.jwt.issuer.clone(),
        expiration_secs: config.jwt.expiration_secs,
        leeway_secs: config.jwt.leeway_secs,
        ..JwtConfig::default()
    };

    ApiConfig {
        host: server.host,
        port: server.port,
        base_path: server.base_path.clone(),
        cors,
        jwt,
        audit: AuditConfig {
            enabled: config.audit.effective_backend() != AuditBackend::None,
            authorization_failures: config.audit.authorization_failures,
        },
        request_timeout_secs: server.request_timeout_secs,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use portal_config::Secret;

    fn test_config() -> PortalConfig {
        let mut config = PortalConfig::default();
        config.jwt.secret = Secret::new("runtime-test-secret-that-is-long-enough");
        config.server.port = 0;
        config
    }

    #[test]
    fn test_api_config_mapping() {
        let mut config = test_config();
        config.server.port = 9100;
        config.server.cors_origins = vec!["http://localhost:5173".to_string()];
        config.jwt.expiration_secs = 3600;

        let api = api_config(&config);
        assert_eq!(api.port, 9100);
        assert_eq!(api.base_path, "/api");
        assert_eq!(api.jwt.secret, "runtime-test-secret-that-is-long-enough");
        assert_eq!(api.jwt.expiration_secs, 3600);
        assert!(api.jwt.token_id);
        assert!(!api.cors.allows_any_origin());
        assert!(api.cors.allow_credentials);
        assert!(api.audit.enabled);
    }

    #[test]
    fn test_disabled_audit_maps_through() {
        let mut config = test_config();
        config.audit.backend = AuditBackend::None;
        assert!(!api_config(&config).audit.enabled);
        assert_eq!(create_audit_logger(&config).name(), NoOpAuditLogger.name());
    }

    #[test]
    fn test_memory_backend_selected() {
        let mut config = test_config();
        config.audit.backend = AuditBackend::Memory;
        let logger = create_audit_logger(&config);
        assert_eq!(logger.name(), "memory");
        assert!(logger.supports_query());
    }

    #[tokio::test]
    async fn test_run_seeds_and_stops_on_shutdown() {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let runtime = PortalRuntime::new(test_config()).with_users(users.clone());
        let shutdown = runtime.shutdown().clone();

        let handle = tokio::spawn(runtime.run());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.initiate_shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("runtime should stop")
            .unwrap();
        assert!(result.is_ok());
        assert!(users
            .find_by_email("superadmin@portal.test")
            .await
            .unwrap()
            .is_some());
    }
}
