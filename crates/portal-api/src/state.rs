// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use portal_core::audit::{AuditLog, AuditLogger, NoOpAuditLogger};
use portal_core::{
    CredentialVerifier, InMemoryUserStore, PermissionEvaluator, RoleAdministration, UserStore,
};

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::error::ApiResult;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Every component is constructed explicitly and injected; nothing here is
/// process-global.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token issuer.
    pub issuer: Arc<TokenIssuer>,
    /// Permission evaluator over the role registry.
    pub evaluator: PermissionEvaluator,
    /// User storage.
    pub users: Arc<dyn UserStore>,
    /// Login credential verification.
    pub verifier: CredentialVerifier,
    /// Role administration workflow.
    pub role_admin: RoleAdministration,
    /// Audit logger.
    pub audit_logger: Arc<dyn AuditLogger>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token issuer.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Returns the permission evaluator.
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Returns the user store.
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Returns the audit logger.
    pub fn audit(&self) -> &Arc<dyn AuditLogger> {
        &self.audit_logger
    }

    /// Writes an audit entry without blocking the request.
    pub fn record(&self, entry: AuditLog) {
        if !self.config.audit.enabled {
            return;
        }
        let logger = self.audit_logger.clone();
        tokio::spawn(async move {
            if let Err(e) = logger.log(entry).await {
                tracing::warn!(error = %e, "Failed to write audit log");
            }
        });
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    issuer: Option<Arc<TokenIssuer>>,
    evaluator: Option<PermissionEvaluator>,
    users: Option<Arc<dyn UserStore>>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the token issuer.
    pub fn issuer(mut self, issuer: Arc<TokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Sets the permission evaluator.
    pub fn evaluator(mut self, evaluator: PermissionEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Sets the user store.
    pub fn users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Builds the AppState.
    ///
    /// Missing components fall back to the standard registry, an empty
    /// in-memory store and a no-op audit logger. Fails if no issuer is set
    /// and the configured JWT settings are invalid.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let issuer = match self.issuer {
            Some(issuer) => issuer,
            None => Arc::new(TokenIssuer::new(config.jwt.clone())?),
        };

        let evaluator = self.evaluator.unwrap_or_default();
        let users = self
            .users
            .unwrap_or_else(|| Arc::new(InMemoryUserStore::new()));
        let audit_logger = self
            .audit_logger
            .unwrap_or_else(|| Arc::new(NoOpAuditLogger));

        let verifier = CredentialVerifier::new(users.clone()).with_audit_logger(audit_logger.clone());
        let role_admin = RoleAdministration::new(users.clone(), evaluator.clone())
            .with_audit_logger(audit_logger.clone());

        Ok(AppState {
            config: Arc::new(config),
            issuer,
            evaluator,
            users,
            verifier,
            role_admin,
            audit_logger,
            started_at: Instant::now(),
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.issuer.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use portal_core::{Role, User};

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough-for-testing"))
    }

    #[test]
    fn test_app_state_builder_defaults() {
        let state = AppState::builder().config(test_config()).build().unwrap();

        assert_eq!(state.issuer().expiration_secs(), 604_800);
        assert_eq!(state.users().name(), "memory");
        assert_eq!(state.audit().name(), "noop");
    }

    #[test]
    fn test_app_state_requires_secret() {
        assert!(AppState::builder().build().is_err());
    }

    #[tokio::test]
    async fn test_app_state_shares_store() {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::builder()
            .config(test_config())
            .users(store.clone())
            .build()
            .unwrap();

        store
            .insert(User::new("Dev", "dev@portal.test", "x", Role::Developer))
            .await
            .unwrap();

        assert_eq!(state.users().list().await.unwrap().len(), 1);
    }
}
