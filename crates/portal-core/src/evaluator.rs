// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission evaluation.
//!
//! Every check accepts `impl Into<Option<Role>>`, so callers can pass either
//! a concrete [`Role`] or the optional role of a possibly anonymous session.
//! An absent role denies every check.

use crate::registry::RoleRegistry;
use crate::role::{Action, Resource, Role};
use crate::user::User;

/// Decides allow/deny over a [`RoleRegistry`].
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    registry: RoleRegistry,
}

impl PermissionEvaluator {
    /// Creates an evaluator over the given registry.
    pub fn new(registry: RoleRegistry) -> Self {
        Self { registry }
    }

    /// Creates an evaluator over the standard role table.
    pub fn standard() -> Self {
        Self::new(RoleRegistry::standard())
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Returns `true` iff the role has an entry for `resource` that allows `action`.
    pub fn has_permission(
        &self,
        role: impl Into<Option<Role>>,
        resource: Resource,
        action: Action,
    ) -> bool {
        self.registry
            .permissions_for(role)
            .iter()
            .any(|perm| perm.resource == resource && perm.allows(action))
    }

    /// Returns `true` iff the role has any entry for `resource`.
    ///
    /// This is the coarse check used to show or hide a whole section.
    pub fn can_access_resource(&self, role: impl Into<Option<Role>>, resource: Resource) -> bool {
        self.registry
            .permissions_for(role)
            .iter()
            .any(|perm| perm.resource == resource)
    }

    /// Returns `true` if `actor` may act on a user holding `target`.
    ///
    /// With `actor_is_super_admin` the check always passes, including for
    /// equal or higher ranks. Otherwise the target must rank strictly lower.
    pub fn can_act_on_lower_rank(
        &self,
        actor: impl Into<Option<Role>>,
        target: impl Into<Option<Role>>,
        actor_is_super_admin: bool,
    ) -> bool {
        if actor_is_super_admin {
            return true;
        }
        self.registry.hierarchy_level(target) < self.registry.hierarchy_level(actor)
    }

    /// Hierarchy check where the override is derived from the actor's role.
    pub fn can_edit_user(&self, actor: Role, target: Role) -> bool {
        self.can_act_on_lower_rank(actor, target, actor.is_super_admin())
    }

    /// Checks a permission for a user record.
    ///
    /// Deactivated users hold no permissions.
    pub fn user_has_permission(&self, user: &User, resource: Resource, action: Action) -> bool {
        user.is_active && self.has_permission(user.role, resource, action)
    }

    /// Returns the roles whose holders `actor` may act on.
    pub fn editable_roles(&self, actor: Role) -> Vec<Role> {
        self.registry
            .ranked_roles()
            .into_iter()
            .filter(|target| self.can_edit_user(actor, *target))
            .collect()
    }
}
