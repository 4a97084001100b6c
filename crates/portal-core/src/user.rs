// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User records and their public projections.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::role::Role;

/// Normalizes an email for lookup and uniqueness: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// User
// =============================================================================

/// A stored user.
///
/// `password_hash` holds either a PHC-format hash or, for accounts created
/// before hashing was introduced, the legacy plaintext value. It is never
/// serialized and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Immutable unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
    /// Stored credential.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// The single role of this user.
    pub role: Role,
    /// Organizational department (free text).
    #[serde(default)]
    pub department: String,
    /// Deactivated users cannot authenticate.
    pub is_active: bool,
    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with a fresh id.
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            role,
            department: String::new(),
            is_active: true,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Sets the activation flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Sets the avatar reference.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Refreshes the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the public projection of this user.
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("department", &self.department)
            .field("is_active", &self.is_active)
            .field("avatar", &self.avatar)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

// =============================================================================
// UserSummary
// =============================================================================

/// Public view of a user, as returned by the API and cached in sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Department.
    #[serde(default)]
    pub department: String,
    /// Activation flag.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Avatar reference.
    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_active() -> bool {
    true
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            department: user.department.clone(),
            is_active: user.is_active,
            avatar: user.avatar.clone(),
        }
    }
}

// =============================================================================
// NewUser
// =============================================================================

/// Input for provisioning a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email, normalized on creation.
    #[serde(default)]
    pub email: String,
    /// Plaintext password, hashed on creation.
    #[serde(default)]
    pub password: String,
    /// Role; defaults to [`Role::Developer`].
    #[serde(default)]
    pub role: Option<Role>,
    /// Department.
    #[serde(default)]
    pub department: Option<String>,
    /// Avatar reference.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl NewUser {
    /// Creates provisioning input.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Sets the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Checks that name, email and password are present.
    pub fn validate(&self) -> CoreResult<()> {
        let missing: Vec<&str> = [
            ("name", self.name.trim()),
            ("email", self.email.trim()),
            ("password", self.password.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Builds the stored record from an already hashed password.
    pub fn into_user(self, password_hash: String) -> User {
        let mut user = User::new(
            self.name.trim(),
            &self.email,
            password_hash,
            self.role.unwrap_or_default(),
        );
        user.department = self.department.unwrap_or_default();
        user.avatar = self.avatar;
        user
    }
}

// =============================================================================
// UserPatch
// =============================================================================

/// Partial update of a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
    /// New plaintext password.
    #[serde(default)]
    pub password: Option<String>,
    /// New role. Applied only through the role administration workflow.
    #[serde(default)]
    pub role: Option<Role>,
    /// New department.
    #[serde(default)]
    pub department: Option<String>,
    /// New activation flag.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// New avatar reference.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserPatch {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.department.is_none()
            && self.is_active.is_none()
            && self.avatar.is_none()
    }

    /// Applies the profile fields to `user`.
    ///
    /// `role` and `password` are not applied here: the role goes through
    /// [`RoleAdministration`](crate::admin::RoleAdministration) and the
    /// password must be hashed by the caller.
    pub fn apply_profile(&self, user: &mut User) -> CoreResult<()> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::validation("Name must not be empty"));
            }
            user.name = name.to_string();
        }
        if let Some(email) = &self.email {
            let email = normalize_email(email);
            if email.is_empty() {
                return Err(CoreError::validation("Email must not be empty"));
            }
            user.email = email;
        }
        if let Some(department) = &self.department {
            user.department = department.clone();
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
        user.touch();
        Ok(())
    }
}
