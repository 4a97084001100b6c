// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use portal_core::audit::AuditLogger;
use portal_core::{Action, PermissionEvaluator, Resource, Role, UserStore};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuditLayer, AuthLayer, RequirePermissionLayer, RequireRolesLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Returns the shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = create_cors_layer(&self.config);
        let auth = AuthLayer::new(self.state.issuer.clone(), self.state.users.clone())
            .with_default_public_paths(&self.config.base_path);
        let audit = AuditLayer::new(self.state.audit_logger.clone(), self.config.audit.clone());

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout(),
            ))
            .layer(cors)
            .layer(auth)
            .layer(audit);

        let base = self.config.base_path.trim_end_matches('/');
        let api = api_routes(self.state.evaluator.clone());
        let router = if base.is_empty() {
            api
        } else {
            Router::new().nest(base, api)
        };

        router.layer(middleware_stack).with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

/// Builds the routes below the base path.
///
/// Every route except health and login requires a token (see [`AuthLayer`]).
/// Reading users needs `users: read`; writing them needs an administrative
/// role, and role changes are further ranked by [`RoleAdministration`].
///
/// [`RoleAdministration`]: portal_core::RoleAdministration
fn api_routes(evaluator: PermissionEvaluator) -> Router<AppState> {
    let user_readers = RequirePermissionLayer::new(evaluator, Resource::Users, Action::Read);
    let user_admins = RequireRolesLayer::new([Role::SuperAdmin, Role::Manager]);
    let super_admins = RequireRolesLayer::new([Role::SuperAdmin]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        .route(
            "/users",
            get(handlers::list_users)
                .route_layer(user_readers.clone())
                .merge(post(handlers::create_user).route_layer(user_admins.clone())),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .route_layer(user_readers)
                .merge(put(handlers::update_user).route_layer(user_admins.clone()))
                .merge(delete(handlers::delete_user).route_layer(super_admins)),
        )
        .route(
            "/users/{id}/role",
            put(handlers::change_role).route_layer(user_admins),
        )
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new()
        .max_age(Duration::from_secs(cors.max_age))
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    if cors.allows_any_origin() {
        // Credentials cannot be combined with a wildcard origin.
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(cors.allow_credentials)
    }
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
pub struct ApiServerBuilder {
    state_builder: crate::state::AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the token issuer.
    pub fn issuer(mut self, issuer: Arc<TokenIssuer>) -> Self {
        self.state_builder = self.state_builder.issuer(issuer);
        self
    }

    /// Sets the permission evaluator.
    pub fn evaluator(mut self, evaluator: PermissionEvaluator) -> Self {
        self.state_builder = self.state_builder.evaluator(evaluator);
        self
    }

    /// Sets the user store.
    pub fn users(mut self, users: Arc<dyn UserStore>) -> Self {
        self.state_builder = self.state_builder.users(users);
        self
    }

    /// Sets the audit logger.
    pub fn audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.state_builder = self.state_builder.audit_logger(logger);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
