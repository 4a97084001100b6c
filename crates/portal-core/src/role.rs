// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Roles, resources, actions and permission entries.
//!
//! The string forms of these types are the wire contract between the client
//! and the server. Deserialization rejects anything outside the enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Role
// =============================================================================

/// The fixed set of portal roles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access, including acting on equal or higher ranks.
    SuperAdmin,
    /// Team and project management.
    Manager,
    /// People administration and reporting.
    Hr,
    /// Engineering contributor.
    #[default]
    Developer,
    /// Quality assurance contributor.
    Qa,
    /// Design contributor.
    Designer,
    /// Reporting-only access.
    BusinessAnalyst,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Role; 7] = [
        Role::SuperAdmin,
        Role::Manager,
        Role::Hr,
        Role::Developer,
        Role::Qa,
        Role::Designer,
        Role::BusinessAnalyst,
    ];

    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Manager => "MANAGER",
            Role::Hr => "HR",
            Role::Developer => "DEVELOPER",
            Role::Qa => "QA",
            Role::Designer => "DESIGNER",
            Role::BusinessAnalyst => "BUSINESS_ANALYST",
        }
    }

    /// Parses a role from its exact wire name.
    ///
    /// Matching is case-sensitive; aliases are not accepted.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// Returns all roles.
    pub fn all() -> &'static [Role] {
        &Self::ALL
    }

    /// Returns `true` for the super-admin role.
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Returns `true` for the reporting-only role.
    pub fn is_reporting_only(&self) -> bool {
        matches!(self, Role::BusinessAnalyst)
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Manager => "Manager",
            Role::Hr => "HR",
            Role::Developer => "Developer",
            Role::Qa => "QA",
            Role::Designer => "Designer",
            Role::BusinessAnalyst => "Business Analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| CoreError::unknown_role(s))
    }
}

// =============================================================================
// Resource
// =============================================================================

/// Resources guarded by permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// User accounts.
    Users,
    /// Projects.
    Projects,
    /// Tasks.
    Tasks,
    /// Reports and exports.
    Reports,
    /// Personal settings.
    Settings,
    /// Administration area.
    Admin,
}

impl Resource {
    /// All resources.
    pub const ALL: [Resource; 6] = [
        Resource::Users,
        Resource::Projects,
        Resource::Tasks,
        Resource::Reports,
        Resource::Settings,
        Resource::Admin,
    ];

    /// Returns the resource name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Projects => "projects",
            Resource::Tasks => "tasks",
            Resource::Reports => "reports",
            Resource::Settings => "settings",
            Resource::Admin => "admin",
        }
    }

    /// Parses a resource name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Action
// =============================================================================

/// Actions a permission may allow on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Create new records.
    Create,
    /// Read records.
    Read,
    /// Modify records.
    Update,
    /// Remove records.
    Delete,
    /// Export data.
    Export,
    /// Enter an area.
    Access,
}

impl Action {
    /// All actions.
    pub const ALL: [Action; 6] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Export,
        Action::Access,
    ];

    /// Returns the action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Export => "export",
            Action::Access => "access",
        }
    }

    /// Parses an action name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Permission
// =============================================================================

/// A resource together with the actions allowed on it.
///
/// Permissions are additive: there is no deny entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// The guarded resource.
    pub resource: Resource,
    /// Allowed actions, in declaration order.
    pub actions: Vec<Action>,
}

impl Permission {
    /// Creates a permission entry.
    pub fn new(resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            resource,
            actions: actions.into_iter().collect(),
        }
    }

    /// Returns `true` if this entry allows `action`.
    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(Action::as_str).collect();
        write!(f, "{}: {}", self.resource, actions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names_roundtrip_through_parse() {
        for role in Role::all() {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
    }

    #[test]
    fn test_role_parse_rejects_unknown_and_case_variants() {
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::parse("super_admin"), None);
        assert_eq!(Role::parse(""), None);
        assert!("INTERN".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::BusinessAnalyst).unwrap();
        assert_eq!(json, "\"BUSINESS_ANALYST\"");

        let role: Role = serde_json::from_str("\"QA\"").unwrap();
        assert_eq!(role, Role::Qa);

        assert!(serde_json::from_str::<Role>("\"GUEST\"").is_err());
    }

    #[test]
    fn test_default_role_is_developer() {
        assert_eq!(Role::default(), Role::Developer);
    }

    #[test]
    fn test_permission_allows() {
        let perm = Permission::new(Resource::Tasks, [Action::Read, Action::Update]);
        assert!(perm.allows(Action::Update));
        assert!(!perm.allows(Action::Delete));
        assert_eq!(perm.to_string(), "tasks: read, update");
    }

    #[test]
    fn test_resource_and_action_parse() {
        assert_eq!(Resource::parse("reports"), Some(Resource::Reports));
        assert_eq!(Resource::parse("Reports"), None);
        assert_eq!(Action::parse("export"), Some(Action::Export));
        assert_eq!(Action::parse("purge"), None);
    }
}
