// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit entries and the vocabulary used to classify them.
//!
//! Entries are built through the named constructors on [`AuditLog`]
//! (`login`, `role_change`, `access_denied`, ...) so that every producer
//! fills the same fields the same way.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::MigrationOutcome;
use crate::role::Role;

// =============================================================================
// AuditLog
// =============================================================================

/// One recorded security event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Time-ordered entry id.
    pub id: Uuid,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Reporting level.
    pub severity: AuditSeverity,
    /// Acting user, absent for anonymous requests and system events.
    pub user_id: Option<String>,
    /// Caller address, when known.
    pub client_ip: Option<IpAddr>,
    /// Event kind.
    pub action: AuditAction,
    /// What the event concerns.
    pub resource: AuditResource,
    /// Event-specific fields, `null` when there are none.
    pub details: serde_json::Value,
    /// Outcome.
    pub result: ActionResult,
    /// Request id of the HTTP request that produced the entry.
    pub correlation_id: Option<Uuid>,
}

impl AuditLog {
    /// Creates an entry with the action's default severity.
    pub fn new(action: AuditAction, resource: AuditResource, result: ActionResult) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            severity: action.default_severity(),
            user_id: None,
            client_ip: None,
            action,
            resource,
            details: serde_json::Value::Null,
            result,
            correlation_id: None,
        }
    }

    /// Sets the acting user and their address.
    pub fn with_user(mut self, user_id: impl Into<String>, client_ip: Option<IpAddr>) -> Self {
        self.user_id = Some(user_id.into());
        self.client_ip = client_ip;
        self
    }

    fn with_client_ip(mut self, client_ip: Option<IpAddr>) -> Self {
        self.client_ip = client_ip;
        self
    }

    /// Replaces the details object.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Links the entry to a request.
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// A successful or failed login of a known user.
    pub fn login(user_id: impl Into<String>, client_ip: Option<IpAddr>, success: bool) -> Self {
        let user_id = user_id.into();
        let (action, result, severity) = if success {
            (AuditAction::Login, ActionResult::Success, AuditSeverity::Info)
        } else {
            (
                AuditAction::LoginFailed,
                ActionResult::failure("Invalid credentials"),
                AuditSeverity::Warning,
            )
        };

        Self::new(action, AuditResource::user(&user_id), result)
            .with_user(&user_id, client_ip)
            .with_severity(severity)
    }

    /// A failed login for an email that did not resolve to an active user.
    pub fn login_failed(email: impl Into<String>, client_ip: Option<IpAddr>) -> Self {
        Self::new(
            AuditAction::LoginFailed,
            AuditResource::new("account", email),
            ActionResult::failure("Invalid credentials"),
        )
        .with_client_ip(client_ip)
    }

    /// A logout.
    pub fn logout(user_id: impl Into<String>, client_ip: Option<IpAddr>) -> Self {
        let user_id = user_id.into();
        Self::new(
            AuditAction::Logout,
            AuditResource::user(&user_id),
            ActionResult::Success,
        )
        .with_user(&user_id, client_ip)
    }

    /// A user provisioned by `actor_id`.
    pub fn user_created(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        role: Role,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(
            AuditAction::UserCreate,
            AuditResource::user(target_id),
            ActionResult::Success,
        )
        .with_user(actor_id, client_ip)
        .with_details(serde_json::json!({ "role": role }))
    }

    /// A profile update by `actor_id`.
    pub fn user_updated(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        fields: &[&str],
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(
            AuditAction::UserUpdate,
            AuditResource::user(target_id),
            ActionResult::Success,
        )
        .with_user(actor_id, client_ip)
        .with_details(serde_json::json!({ "fields": fields }))
    }

    /// A user deleted by `actor_id`.
    pub fn user_deleted(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        client_ip: Option<IpAddr>,
    ) -> Self {
        Self::new(
            AuditAction::UserDelete,
            AuditResource::user(target_id),
            ActionResult::Success,
        )
        .with_user(actor_id, client_ip)
    }

    /// A role change attempt.
    pub fn role_change(
        actor_id: impl Into<String>,
        target_id: impl Into<String>,
        from: Role,
        to: Role,
        result: ActionResult,
    ) -> Self {
        let severity = match result {
            ActionResult::Denied => AuditSeverity::Warning,
            ActionResult::Failure { .. } => AuditSeverity::Error,
            _ => AuditSeverity::Notice,
        };

        Self::new(
            AuditAction::PermissionChange,
            AuditResource::user(target_id),
            result,
        )
        .with_user(actor_id, None)
        .with_details(serde_json::json!({ "from": from, "to": to }))
        .with_severity(severity)
    }

    /// The migration phase of a legacy credential.
    pub fn credential_migration(user_id: impl Into<String>, outcome: &MigrationOutcome) -> Self {
        let user_id = user_id.into();
        let result = match outcome {
            MigrationOutcome::Migrated => ActionResult::Success,
            MigrationOutcome::AlreadyMigrated => ActionResult::rejected("already migrated"),
            MigrationOutcome::Failed { reason } => ActionResult::failure(reason.clone()),
        };

        Self::new(
            AuditAction::CredentialMigration,
            AuditResource::user(&user_id),
            result,
        )
        .with_user(user_id, None)
    }

    /// An authorization denial.
    pub fn access_denied(
        resource: AuditResource,
        user_id: impl Into<String>,
        client_ip: Option<IpAddr>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(AuditAction::AccessDenied, resource, ActionResult::Denied)
            .with_user(user_id, client_ip)
            .with_details(serde_json::json!({ "reason": reason.into() }))
    }

    /// Server start.
    pub fn system_start(version: impl Into<String>) -> Self {
        Self::new(
            AuditAction::SystemStart,
            AuditResource::system(),
            ActionResult::Success,
        )
        .with_details(serde_json::json!({ "version": version.into() }))
    }

    /// Server shutdown.
    pub fn system_shutdown() -> Self {
        Self::new(
            AuditAction::SystemShutdown,
            AuditResource::system(),
            ActionResult::Success,
        )
    }
}

// =============================================================================
// Classification
// =============================================================================

/// How loudly an entry is reported. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    /// Routine events.
    #[default]
    Info,
    /// Changes to accounts or credentials.
    Notice,
    /// Rejected logins and denied requests.
    Warning,
    /// An operation that failed part way.
    Error,
}

/// Security event kinds. Serialized in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Successful login.
    Login,
    /// Rejected login.
    LoginFailed,
    /// Logout.
    Logout,
    /// User provisioned.
    UserCreate,
    /// Profile updated.
    UserUpdate,
    /// User deleted.
    UserDelete,
    /// Role change, including denied attempts.
    PermissionChange,
    /// Legacy plaintext credential replaced by a hash.
    CredentialMigration,
    /// Request rejected by a guard.
    AccessDenied,
    /// Server started.
    SystemStart,
    /// Server stopped.
    SystemShutdown,
}

impl AuditAction {
    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::UserCreate => "user_create",
            Self::UserUpdate => "user_update",
            Self::UserDelete => "user_delete",
            Self::PermissionChange => "permission_change",
            Self::CredentialMigration => "credential_migration",
            Self::AccessDenied => "access_denied",
            Self::SystemStart => "system_start",
            Self::SystemShutdown => "system_shutdown",
        }
    }

    /// Severity an entry gets unless its constructor overrides it.
    pub fn default_severity(&self) -> AuditSeverity {
        match self {
            Self::LoginFailed | Self::AccessDenied => AuditSeverity::Warning,
            Self::UserCreate | Self::UserDelete | Self::PermissionChange | Self::CredentialMigration => {
                AuditSeverity::Notice
            }
            Self::Login | Self::Logout | Self::UserUpdate | Self::SystemStart | Self::SystemShutdown => {
                AuditSeverity::Info
            }
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an entry is about, rendered as `type:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResource {
    /// `user`, `account`, `api` or `system`.
    pub resource_type: String,
    /// User id, email, request path or `portal`.
    pub resource_id: String,
}

impl AuditResource {
    /// Creates a resource of any kind.
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// A stored user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new("user", user_id)
    }

    /// An HTTP route.
    pub fn api(path: impl Into<String>) -> Self {
        Self::new("api", path)
    }

    /// The server process.
    pub fn system() -> Self {
        Self::new("system", "portal")
    }

    /// Returns `type:id`.
    pub fn full_path(&self) -> String {
        format!("{}:{}", self.resource_type, self.resource_id)
    }
}

/// Outcome recorded with an entry, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult {
    /// Took effect.
    Success,
    /// Attempted and failed.
    Failure {
        /// What went wrong.
        reason: String,
    },
    /// Refused by an authorization check.
    Denied,
    /// Skipped because there was nothing to do.
    Rejected {
        /// Why it was skipped.
        reason: String,
    },
}

impl ActionResult {
    /// Creates a failure.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Creates a rejection.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`ActionResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` for [`ActionResult::Denied`].
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }
}

// =============================================================================
// Query Filter
// =============================================================================

/// Criteria for [`AuditLogger::query`](super::AuditLogger::query). Unset
/// criteria match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditFilter {
    /// Acting user.
    pub user_id: Option<String>,
    /// Event kind.
    pub action: Option<AuditAction>,
    /// Lowest severity included.
    pub min_severity: Option<AuditSeverity>,
    /// Earliest timestamp included.
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
    /// Newest first.
    pub descending: bool,
}

impl AuditFilter {
    /// Matches every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to entries by `user_id`.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Restricts to one event kind.
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restricts to `severity` and above.
    pub fn min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Caps the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `entry` meets every set criterion.
    pub fn matches(&self, entry: &AuditLog) -> bool {
        let user_ok = self
            .user_id
            .as_deref()
            .map_or(true, |id| entry.user_id.as_deref() == Some(id));
        let action_ok = self.action.map_or(true, |action| entry.action == action);
        let severity_ok = self.min_severity.map_or(true, |min| entry.severity >= min);
        let time_ok = self.since.map_or(true, |since| entry.timestamp >= since);

        user_ok && action_ok && severity_ok && time_ok
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_factory() {
        let ok = AuditLog::login("u_qa", None, true);
        assert_eq!(ok.action, AuditAction::Login);
        assert!(ok.result.is_success());

        let failed = AuditLog::login("u_qa", None, false);
        assert_eq!(failed.action, AuditAction::LoginFailed);
        assert_eq!(failed.severity, AuditSeverity::Warning);
    }

    #[test]
    fn test_role_change_details() {
        let log = AuditLog::role_change("u_manager", "u_dev", Role::Developer, Role::Qa, ActionResult::Success);
        assert_eq!(log.details["from"], "DEVELOPER");
        assert_eq!(log.details["to"], "QA");
        assert_eq!(log.resource.full_path(), "user:u_dev");
    }

    #[test]
    fn test_denied_role_change_is_warning() {
        let log = AuditLog::role_change(
            "u_manager",
            "u_super_admin",
            Role::SuperAdmin,
            Role::Qa,
            ActionResult::Denied,
        );
        assert_eq!(log.severity, AuditSeverity::Warning);
    }

    #[test]
    fn test_failed_role_change_is_error() {
        let log = AuditLog::role_change(
            "u_super_admin",
            "u_dev",
            Role::Developer,
            Role::Qa,
            ActionResult::failure("store unavailable"),
        );
        assert_eq!(log.severity, AuditSeverity::Error);
        assert!(AuditFilter::new().min_severity(AuditSeverity::Warning).matches(&log));
    }

    #[test]
    fn test_filter_matches() {
        let log = AuditLog::logout("u_hr", None);

        assert!(AuditFilter::new().user("u_hr").matches(&log));
        assert!(!AuditFilter::new().user("u_qa").matches(&log));
        assert!(AuditFilter::new().action(AuditAction::Logout).matches(&log));
        assert!(!AuditFilter::new()
            .min_severity(AuditSeverity::Warning)
            .matches(&log));
    }

    #[test]
    fn test_action_result_serialization() {
        let json = serde_json::to_value(ActionResult::failure("nope")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "nope");
    }
}
