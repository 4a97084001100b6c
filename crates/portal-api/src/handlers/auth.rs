// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use portal_core::audit::AuditLog;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ClientIp, ValidatedJson};
use crate::response::AuthResponse;
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// POST /auth/login
///
/// Verifies the credentials, migrating a legacy plaintext credential on the
/// way, and returns a signed token. Every credential failure is answered with
/// the same 401 so callers cannot tell unknown accounts from wrong passwords.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let verification = state
        .verifier
        .verify_and_migrate(&request.email, &request.password)
        .await?;

    let Some(user) = verification.into_user() else {
        state.record(AuditLog::login_failed(&request.email, client_ip));
        return Err(ApiError::invalid_credentials());
    };

    let issued = state.issuer().issue(&user)?;

    state.record(AuditLog::login(&user.id, client_ip, true));
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(AuthResponse::new(issued, user.summary())))
}

// =============================================================================
// Current User
// =============================================================================

/// GET /auth/me
///
/// Returns the current user as stored, not as encoded in the token.
pub async fn me(State(state): State<AppState>, Auth(auth_ctx): Auth) -> ApiResult<impl IntoResponse> {
    let user = state
        .users()
        .find_by_id(&auth_ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account is not active"))?;

    Ok(Json(user.summary()))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Tokens are stateless; logout is recorded and the client discards its token.
pub async fn logout(State(state): State<AppState>, Auth(auth_ctx): Auth) -> impl IntoResponse {
    state.record(AuditLog::logout(&auth_ctx.user_id, auth_ctx.client_ip));
    tracing::info!(user_id = %auth_ctx.user_id, "User logged out");

    StatusCode::NO_CONTENT
}
