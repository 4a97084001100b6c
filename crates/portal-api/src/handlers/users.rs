// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User administration handlers.
//!
//! Route-level guards decide who may reach each handler. Edits and role
//! changes are additionally subject to the hierarchy rules of
//! [`RoleAdministration`].
//!
//! [`RoleAdministration`]: portal_core::RoleAdministration

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use portal_core::audit::AuditLog;
use portal_core::{hash_password, Actor, NewUser, Role, RoleChange, UserPatch};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, UserIdPath, ValidatedJson};
use crate::response::{ApiResponse, RoleChangeResponse, UserListResponse};
use crate::state::AppState;

fn actor_of(ctx: &AuthContext) -> ApiResult<Actor> {
    ctx.actor()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

// =============================================================================
// Read
// =============================================================================

/// GET /users
///
/// Lists all users, newest first.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.users().list().await?;
    let summaries = users.iter().map(|u| u.summary()).collect();
    Ok(Json(UserListResponse::new(summaries)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users()
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {}", user_id)))?;

    Ok(Json(user.summary()))
}

// =============================================================================
// Create
// =============================================================================

/// POST /users
///
/// Provisions a user. A missing role defaults to DEVELOPER.
pub async fn create_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    ValidatedJson(request): ValidatedJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    if state.users().find_by_email(&request.email).await?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password_hash = hash_password(&request.password)?;
    let user = state.users().insert(request.into_user(password_hash)).await?;

    state.record(AuditLog::user_created(
        &auth_ctx.user_id,
        &user.id,
        user.role,
        auth_ctx.client_ip,
    ));
    tracing::info!(actor = %auth_ctx.user_id, user_id = %user.id, role = %user.role, "User created");

    Ok(ApiResponse::created(user.summary()).with_message("User created"))
}

// =============================================================================
// Update
// =============================================================================

/// PUT /users/{id}
///
/// Applies a partial update in one write. Editing another user needs the
/// rank to change their role; a role equal to the current one is a no-op.
/// The password is re-hashed.
pub async fn update_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    UserIdPath(user_id): UserIdPath,
    ValidatedJson(patch): ValidatedJson<UserPatch>,
) -> ApiResult<impl IntoResponse> {
    let actor = actor_of(&auth_ctx)?;

    let password_hash = match patch.password.as_deref() {
        Some("") => return Err(ApiError::validation("Password must not be empty")),
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = state
        .role_admin
        .edit_user(&actor, &user_id, |user| {
            patch.apply_profile(user)?;
            if let Some(hash) = password_hash {
                user.password_hash = hash;
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            Ok(())
        })
        .await?;

    let fields = changed_fields(&patch);
    state.record(AuditLog::user_updated(
        &auth_ctx.user_id,
        &user.id,
        &fields,
        auth_ctx.client_ip,
    ));

    Ok(Json(user.summary()))
}

fn changed_fields(patch: &UserPatch) -> Vec<&'static str> {
    [
        ("name", patch.name.is_some()),
        ("email", patch.email.is_some()),
        ("password", patch.password.is_some()),
        ("role", patch.role.is_some()),
        ("department", patch.department.is_some()),
        ("isActive", patch.is_active.is_some()),
        ("avatar", patch.avatar.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, set)| set.then_some(field))
    .collect()
}

/// Role change request body.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    /// The new role.
    pub role: Role,
}

/// PUT /users/{id}/role
///
/// 403 when the hierarchy forbids the change, 409 when the user already
/// holds the role, 503 when the change could not be saved.
pub async fn change_role(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    UserIdPath(user_id): UserIdPath,
    ValidatedJson(request): ValidatedJson<ChangeRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = actor_of(&auth_ctx)?;

    match state
        .role_admin
        .change_role(&actor, &user_id, request.role)
        .await?
    {
        RoleChange::Changed { user, previous } => Ok(Json(RoleChangeResponse {
            user: user.summary(),
            previous_role: previous,
        })),
        RoleChange::Unchanged { user } => Err(ApiError::conflict(format!(
            "User already has role {}",
            user.role
        ))),
    }
}

// =============================================================================
// Delete
// =============================================================================

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    UserIdPath(user_id): UserIdPath,
) -> ApiResult<impl IntoResponse> {
    state.users().delete(&user_id).await?;

    state.record(AuditLog::user_deleted(
        &auth_ctx.user_id,
        &user_id,
        auth_ctx.client_ip,
    ));
    tracing::info!(actor = %auth_ctx.user_id, user_id = %user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Tests
// =============================================================================
