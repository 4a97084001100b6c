// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The role registry.
//!
//! The registry is plain data: a map from [`Role`] to a [`RoleDefinition`]
//! holding the hierarchy level and the ordered permission entries. It is
//! built once at startup and shared behind an `Arc`, so reads need no
//! synchronization.
//!
//! Lookups never fail. A role that is absent from the table, or no role at
//! all, resolves to an empty permission list and hierarchy level `0`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::role::{Action, Permission, Resource, Role};

const NO_PERMISSIONS: &[Permission] = &[];

// =============================================================================
// RoleDefinition
// =============================================================================

/// Hierarchy level and permissions of a single role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Rank used for "can act on" comparisons. Higher is more privileged.
    pub hierarchy: u32,
    /// Ordered permission entries.
    pub permissions: Vec<Permission>,
}

impl RoleDefinition {
    /// Creates a definition.
    pub fn new(hierarchy: u32, permissions: Vec<Permission>) -> Self {
        Self {
            hierarchy,
            permissions,
        }
    }
}

// =============================================================================
// RoleRegistry
// =============================================================================

/// Immutable role table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleRegistry {
    roles: Arc<BTreeMap<Role, RoleDefinition>>,
}

impl RoleRegistry {
    /// Creates the standard portal role table.
    pub fn standard() -> Self {
        RoleRegistryBuilder::new().with_standard_roles().build()
    }

    /// Creates an empty registry. Every lookup denies.
    pub fn empty() -> Self {
        RoleRegistryBuilder::new().build()
    }

    /// Creates a builder.
    pub fn builder() -> RoleRegistryBuilder {
        RoleRegistryBuilder::new()
    }

    /// Returns the definition of a role, if the table has one.
    pub fn definition(&self, role: impl Into<Option<Role>>) -> Option<&RoleDefinition> {
        role.into().and_then(|role| self.roles.get(&role))
    }

    /// Returns the permissions of a role.
    pub fn permissions_for(&self, role: impl Into<Option<Role>>) -> &[Permission] {
        self.definition(role)
            .map(|def| def.permissions.as_slice())
            .unwrap_or(NO_PERMISSIONS)
    }

    /// Returns the hierarchy level of a role.
    pub fn hierarchy_level(&self, role: impl Into<Option<Role>>) -> u32 {
        self.definition(role).map(|def| def.hierarchy).unwrap_or(0)
    }

    /// Returns the permissions for an untrusted role name.
    ///
    /// Unrecognized names resolve to no permissions.
    pub fn permissions_for_name(&self, name: &str) -> &[Permission] {
        self.permissions_for(Role::parse(name))
    }

    /// Returns the hierarchy level for an untrusted role name.
    pub fn hierarchy_level_for_name(&self, name: &str) -> u32 {
        self.hierarchy_level(Role::parse(name))
    }

    /// Returns `true` if the role has an entry in the table.
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Iterates over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleDefinition)> {
        self.roles.iter().map(|(role, def)| (*role, def))
    }

    /// Returns the roles ordered from most to least privileged.
    pub fn ranked_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.roles.keys().copied().collect();
        roles.sort_by(|a, b| {
            self.hierarchy_level(*b)
                .cmp(&self.hierarchy_level(*a))
                .then(a.cmp(b))
        });
        roles
    }

    /// Returns the number of roles in the table.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// RoleRegistryBuilder
// =============================================================================

/// Builder for [`RoleRegistry`].
#[derive(Debug, Default)]
pub struct RoleRegistryBuilder {
    roles: BTreeMap<Role, RoleDefinition>,
}

impl RoleRegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the standard portal roles.
    pub fn with_standard_roles(mut self) -> Self {
        use Action::*;
        use Resource::*;

        let contributor = || {
            vec![
                Permission::new(Projects, [Read]),
                Permission::new(Tasks, [Read, Update]),
                Permission::new(Reports, [Read]),
                Permission::new(Settings, [Update]),
            ]
        };

        self.roles.insert(
            Role::SuperAdmin,
            RoleDefinition::new(
                100,
                vec![
                    Permission::new(Users, [Create, Read, Update, Delete]),
                    Permission::new(Projects, [Create, Read, Update, Delete]),
                    Permission::new(Tasks, [Create, Read, Update, Delete]),
                    Permission::new(Reports, [Read, Export]),
                    Permission::new(Settings, [Update]),
                    Permission::new(Admin, [Access]),
                ],
            ),
        );
        self.roles.insert(
            Role::Manager,
            RoleDefinition::new(
                80,
                vec![
                    Permission::new(Users, [Read, Update]),
                    Permission::new(Projects, [Create, Read, Update]),
                    Permission::new(Tasks, [Create, Read, Update]),
                    Permission::new(Reports, [Read, Export]),
                    Permission::new(Settings, [Update]),
                    Permission::new(Admin, [Access]),
                ],
            ),
        );
        self.roles.insert(
            Role::Hr,
            RoleDefinition::new(
                60,
                vec![
                    Permission::new(Users, [Read, Update]),
                    Permission::new(Reports, [Read]),
                    Permission::new(Settings, [Update]),
                ],
            ),
        );
        self.roles
            .insert(Role::Developer, RoleDefinition::new(40, contributor()));
        self.roles.insert(Role::Qa, RoleDefinition::new(35, contributor()));
        self.roles
            .insert(Role::Designer, RoleDefinition::new(30, contributor()));
        self.roles.insert(
            Role::BusinessAnalyst,
            RoleDefinition::new(20, vec![Permission::new(Reports, [Read, Export])]),
        );
        self
    }

    /// Adds or replaces a role definition.
    pub fn role(mut self, role: Role, hierarchy: u32, permissions: Vec<Permission>) -> Self {
        self.roles
            .insert(role, RoleDefinition::new(hierarchy, permissions));
        self
    }

    /// Appends a permission entry to an existing role.
    ///
    /// Entries for a resource the role already has are merged.
    pub fn grant(mut self, role: Role, resource: Resource, actions: &[Action]) -> Self {
        let def = self
            .roles
            .entry(role)
            .or_insert_with(|| RoleDefinition::new(0, Vec::new()));

        match def.permissions.iter_mut().find(|p| p.resource == resource) {
            Some(existing) => {
                for action in actions {
                    if !existing.actions.contains(action) {
                        existing.actions.push(*action);
                    }
                }
            }
            None => def
                .permissions
                .push(Permission::new(resource, actions.iter().copied())),
        }
        self
    }

    /// Removes a role from the table.
    pub fn without(mut self, role: Role) -> Self {
        self.roles.remove(&role);
        self
    }

    /// Builds the registry.
    pub fn build(self) -> RoleRegistry {
        RoleRegistry {
            roles: Arc::new(self.roles),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(registry: &RoleRegistry, role: Role) -> (u32, Vec<String>) {
        let entries = registry
            .permissions_for(role)
            .iter()
            .map(ToString::to_string)
            .collect();
        (registry.hierarchy_level(role), entries)
    }

    #[test]
    fn test_standard_table_snapshot() {
        let registry = RoleRegistry::standard();
        let contributor = [
            "projects: read",
            "tasks: read, update",
            "reports: read",
            "settings: update",
        ];

        let expected: [(Role, u32, &[&str]); 7] = [
            (
                Role::SuperAdmin,
                100,
                &[
                    "users: create, read, update, delete",
                    "projects: create, read, update, delete",
                    "tasks: create, read, update, delete",
                    "reports: read, export",
                    "settings: update",
                    "admin: access",
                ],
            ),
            (
                Role::Manager,
                80,
                &[
                    "users: read, update",
                    "projects: create, read, update",
                    "tasks: create, read, update",
                    "reports: read, export",
                    "settings: update",
                    "admin: access",
                ],
            ),
            (
                Role::Hr,
                60,
                &["users: read, update", "reports: read", "settings: update"],
            ),
            (Role::Developer, 40, &contributor),
            (Role::Qa, 35, &contributor),
            (Role::Designer, 30, &contributor),
            (Role::BusinessAnalyst, 20, &["reports: read, export"]),
        ];

        for (role, level, entries) in expected {
            let entries: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
            assert_eq!(table(&registry, role), (level, entries), "{role}");
        }
    }


    #[test]
    fn test_standard_hierarchy_levels() {
        let registry = RoleRegistry::standard();

        assert_eq!(registry.hierarchy_level(Role::SuperAdmin), 100);
        assert_eq!(registry.hierarchy_level(Role::Manager), 80);
        assert_eq!(registry.hierarchy_level(Role::Hr), 60);
        assert_eq!(registry.hierarchy_level(Role::Developer), 40);
        assert_eq!(registry.hierarchy_level(Role::Qa), 35);
        assert_eq!(registry.hierarchy_level(Role::Designer), 30);
        assert_eq!(registry.hierarchy_level(Role::BusinessAnalyst), 20);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_absent_role_fails_closed() {
        let registry = RoleRegistry::standard();

        assert!(registry.permissions_for(None).is_empty());
        assert_eq!(registry.hierarchy_level(None), 0);
        assert!(registry.permissions_for_name("INTERN").is_empty());
        assert_eq!(registry.hierarchy_level_for_name("manager"), 0);
        assert_eq!(registry.hierarchy_level_for_name("MANAGER"), 80);
    }

    #[test]
    fn test_role_missing_from_table() {
        let registry = RoleRegistry::builder()
            .with_standard_roles()
            .without(Role::Designer)
            .build();

        assert!(!registry.contains(Role::Designer));
        assert!(registry.permissions_for(Role::Designer).is_empty());
        assert_eq!(registry.hierarchy_level(Role::Designer), 0);
    }

    #[test]
    fn test_permission_order_preserved() {
        let registry = RoleRegistry::standard();
        let resources: Vec<Resource> = registry
            .permissions_for(Role::Hr)
            .iter()
            .map(|p| p.resource)
            .collect();

        assert_eq!(
            resources,
            vec![Resource::Users, Resource::Reports, Resource::Settings]
        );
    }

    #[test]
    fn test_ranked_roles() {
        let ranked = RoleRegistry::standard().ranked_roles();
        assert_eq!(ranked.first(), Some(&Role::SuperAdmin));
        assert_eq!(ranked.last(), Some(&Role::BusinessAnalyst));
    }

    #[test]
    fn test_builder_grant_merges_actions() {
        let registry = RoleRegistry::builder()
            .role(Role::Qa, 10, vec![Permission::new(Resource::Tasks, [Action::Read])])
            .grant(Role::Qa, Resource::Tasks, &[Action::Read, Action::Update])
            .grant(Role::Qa, Resource::Reports, &[Action::Read])
            .build();

        let perms = registry.permissions_for(Role::Qa);
        assert_eq!(perms.len(), 2);
        assert_eq!(perms[0].actions, vec![Action::Read, Action::Update]);
    }

    #[test]
    fn test_registry_serializes_as_role_map() {
        let registry = RoleRegistry::standard();
        let value = serde_json::to_value(&registry).unwrap();

        assert_eq!(value["BUSINESS_ANALYST"]["hierarchy"], 20);
        assert_eq!(
            value["BUSINESS_ANALYST"]["permissions"][0]["resource"],
            "reports"
        );

        let back: RoleRegistry = serde_json::from_value(value).unwrap();
        assert_eq!(back, registry);
    }
}
