// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role administration workflow.
//!
//! A role change is authorized against the target's role *before* the
//! change: the actor must outrank the target, unless the actor is a super
//! admin. The outcome distinguishes a denial (`Forbidden`) from a failed
//! write (`Storage`, retryable), and a failed write leaves the target's role
//! unchanged.
//!
//! Tokens already issued to the target are not touched here.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audit::{ActionResult, AuditLog, AuditLogger, AuditResource};
use crate::error::{CoreError, CoreResult};
use crate::evaluator::PermissionEvaluator;
use crate::role::Role;
use crate::store::UserStore;
use crate::user::User;

// =============================================================================
// Actor
// =============================================================================

/// The authenticated user performing an administrative action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Actor user id.
    pub id: String,
    /// Actor role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}

// =============================================================================
// RoleChange
// =============================================================================

/// Successful outcome of [`RoleAdministration::change_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChange {
    /// The role was updated.
    Changed {
        /// The updated user.
        user: User,
        /// The role before the change.
        previous: Role,
    },
    /// The requested role equals the current one; nothing was written.
    Unchanged {
        /// The untouched user.
        user: User,
    },
}

impl RoleChange {
    /// Returns `true` if a write happened.
    pub fn is_changed(&self) -> bool {
        matches!(self, RoleChange::Changed { .. })
    }

    /// Returns the resulting user.
    pub fn user(&self) -> &User {
        match self {
            RoleChange::Changed { user, .. } | RoleChange::Unchanged { user } => user,
        }
    }

    /// Consumes the outcome, returning the resulting user.
    pub fn into_user(self) -> User {
        match self {
            RoleChange::Changed { user, .. } | RoleChange::Unchanged { user } => user,
        }
    }
}

// =============================================================================
// RoleAdministration
// =============================================================================

/// Changes user roles subject to the hierarchy rules.
#[derive(Clone)]
pub struct RoleAdministration {
    store: Arc<dyn UserStore>,
    evaluator: PermissionEvaluator,
    audit_logger: Option<Arc<dyn AuditLogger>>,
}

impl RoleAdministration {
    /// Creates the workflow.
    pub fn new(store: Arc<dyn UserStore>, evaluator: PermissionEvaluator) -> Self {
        Self {
            store,
            evaluator,
            audit_logger: None,
        }
    }

    /// Records changes and denials to `logger`.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Returns the evaluator used for hierarchy checks.
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Checks whether `actor` may change the role of a user holding `target_role`.
    pub fn authorize(&self, actor: &Actor, target_role: Role) -> CoreResult<()> {
        if self
            .evaluator
            .can_act_on_lower_rank(actor.role, target_role, actor.role.is_super_admin())
        {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "{} cannot change the role of a {} user",
                actor.role, target_role
            )))
        }
    }

    /// Changes the role of `target_id` to `new_role`.
    ///
    /// Fails with `NotFound` for an unknown target, `Forbidden` when the
    /// hierarchy check fails and `Storage` when the write fails. A request
    /// for the current role returns [`RoleChange::Unchanged`] without writing.
    pub async fn change_role(
        &self,
        actor: &Actor,
        target_id: &str,
        new_role: Role,
    ) -> CoreResult<RoleChange> {
        let target = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {}", target_id)))?;
        let previous = target.role;

        if let Err(e) = self.authorize(actor, previous) {
            debug!(
                actor = %actor.id,
                target = %target.id,
                from = %previous,
                to = %new_role,
                "Role change denied"
            );
            self.record(AuditLog::role_change(
                &actor.id,
                &target.id,
                previous,
                new_role,
                ActionResult::Denied,
            ))
            .await;
            return Err(e);
        }

        if new_role == previous {
            return Ok(RoleChange::Unchanged { user: target });
        }

        match self.store.set_role(&target.id, new_role).await {
            Ok(user) => {
                info!(
                    actor = %actor.id,
                    target = %user.id,
                    from = %previous,
                    to = %new_role,
                    "Role changed"
                );
                self.record(AuditLog::role_change(
                    &actor.id,
                    &user.id,
                    previous,
                    new_role,
                    ActionResult::Success,
                ))
                .await;
                Ok(RoleChange::Changed { user, previous })
            }
            Err(e) => {
                warn!(target = %target.id, error = %e, "Failed to save role change");
                self.record(AuditLog::role_change(
                    &actor.id,
                    &target.id,
                    previous,
                    new_role,
                    ActionResult::failure(e.to_string()),
                ))
                .await;
                Err(match e {
                    CoreError::NotFound { .. } | CoreError::Storage { .. } => e,
                    other => CoreError::storage(other.to_string()),
                })
            }
        }
    }

    /// Applies `edit` to `target_id` and saves the result in a single write.
    ///
    /// Editing another user needs the same rank as changing their role. An
    /// actor may edit their own profile, but changing their own role is
    /// authorized like any other role change. When the write fails nothing
    /// is stored, including a role change made by `edit`.
    pub async fn edit_user<F>(&self, actor: &Actor, target_id: &str, edit: F) -> CoreResult<User>
    where
        F: FnOnce(&mut User) -> CoreResult<()>,
    {
        let target = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {}", target_id)))?;
        let previous = target.role;

        let mut edited = target.clone();
        edit(&mut edited)?;
        let new_role = edited.role;
        let role_changed = new_role != previous;

        if actor.id != target.id || role_changed {
            if let Err(e) = self.authorize(actor, previous) {
                debug!(actor = %actor.id, target = %target.id, "User edit denied");
                let entry = if role_changed {
                    AuditLog::role_change(&actor.id, &target.id, previous, new_role, ActionResult::Denied)
                } else {
                    AuditLog::access_denied(AuditResource::user(&target.id), &actor.id, None, e.to_string())
                };
                self.record(entry).await;
                return Err(e);
            }
        }

        edited.touch();
        match self.store.update(edited).await {
            Ok(user) => {
                if role_changed {
                    info!(actor = %actor.id, target = %user.id, from = %previous, to = %new_role, "Role changed");
                    self.record(AuditLog::role_change(
                        &actor.id,
                        &user.id,
                        previous,
                        new_role,
                        ActionResult::Success,
                    ))
                    .await;
                }
                Ok(user)
            }
            Err(e) => {
                warn!(target = %target.id, error = %e, "Failed to save user edit");
                if role_changed {
                    self.record(AuditLog::role_change(
                        &actor.id,
                        &target.id,
                        previous,
                        new_role,
                        ActionResult::failure(e.to_string()),
                    ))
                    .await;
                }
                Err(e)
            }
        }
    }

    async fn record(&self, entry: AuditLog) {
        if let Some(logger) = &self.audit_logger {
            if let Err(e) = logger.log(entry).await {
                warn!(error = %e, "Failed to record audit entry");
            }
        }
    }
}

impl fmt::Debug for RoleAdministration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleAdministration")
            .field("store", &self.store.name())
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, InMemoryAuditLogger};
    use crate::store::InMemoryUserStore;
    use async_trait::async_trait;

    fn user(id: &str, role: Role) -> User {
        User::new(id, &format!("{}@portal.test", id), "hash", role).with_id(id)
    }

    fn setup() -> (Arc<InMemoryUserStore>, Arc<InMemoryAuditLogger>, RoleAdministration) {
        let store = Arc::new(InMemoryUserStore::with_users([
            user("root", Role::SuperAdmin),
            user("root2", Role::SuperAdmin),
            user("boss", Role::Manager),
            user("boss2", Role::Manager),
            user("dev", Role::Developer),
        ]));
        let audit = Arc::new(InMemoryAuditLogger::new());
        let admin = RoleAdministration::new(store.clone(), PermissionEvaluator::standard())
            .with_audit_logger(audit.clone());
        (store, audit, admin)
    }

    #[tokio::test]
    async fn test_manager_cannot_change_super_admin() {
        let (store, audit, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);

        let err = admin.change_role(&manager, "root", Role::Qa).await.unwrap_err();

        assert!(err.is_forbidden());
        assert_eq!(store.find_by_id("root").await.unwrap().unwrap().role, Role::SuperAdmin);
        assert!(audit.has_entry(|l| l.action == AuditAction::PermissionChange && l.result.is_denied()));
    }

    #[tokio::test]
    async fn test_manager_cannot_change_peer_or_self() {
        let (_, _, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);

        assert!(admin.change_role(&manager, "boss2", Role::Qa).await.unwrap_err().is_forbidden());
        assert!(admin.change_role(&manager, "boss", Role::Qa).await.unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn test_manager_changes_lower_rank() {
        let (store, audit, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);
        let before = store.find_by_id("dev").await.unwrap().unwrap().updated_at;

        let outcome = admin.change_role(&manager, "dev", Role::Qa).await.unwrap();

        match outcome {
            RoleChange::Changed { ref user, previous } => {
                assert_eq!(previous, Role::Developer);
                assert_eq!(user.role, Role::Qa);
                assert!(user.updated_at >= before);
            }
            RoleChange::Unchanged { .. } => panic!("expected a change"),
        }
        assert_eq!(audit.entries_for_action(AuditAction::PermissionChange).len(), 1);
    }

    #[tokio::test]
    async fn test_super_admin_changes_super_admin() {
        let (store, _, admin) = setup();
        let root = Actor::new("root", Role::SuperAdmin);

        let outcome = admin.change_role(&root, "root2", Role::Manager).await.unwrap();

        assert!(outcome.is_changed());
        assert_eq!(store.find_by_id("root2").await.unwrap().unwrap().role, Role::Manager);
    }

    #[tokio::test]
    async fn test_same_role_is_unchanged() {
        let (_, audit, admin) = setup();
        let root = Actor::new("root", Role::SuperAdmin);

        let outcome = admin.change_role(&root, "dev", Role::Developer).await.unwrap();

        assert!(!outcome.is_changed());
        assert_eq!(outcome.user().role, Role::Developer);
        assert!(audit.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let (_, _, admin) = setup();
        let root = Actor::new("root", Role::SuperAdmin);

        assert!(matches!(
            admin.change_role(&root, "ghost", Role::Qa).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    struct FailingWrites(InMemoryUserStore);

    #[async_trait]
    impl UserStore for FailingWrites {
        async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
            self.0.find_by_email(email).await
        }
        async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>> {
            self.0.find_by_id(id).await
        }
        async fn list(&self) -> CoreResult<Vec<User>> {
            self.0.list().await
        }
        async fn insert(&self, user: User) -> CoreResult<User> {
            self.0.insert(user).await
        }
        async fn update(&self, _user: User) -> CoreResult<User> {
            Err(CoreError::storage("connection reset"))
        }
        async fn set_role(&self, _id: &str, _role: Role) -> CoreResult<User> {
            Err(CoreError::storage("connection reset"))
        }
        async fn replace_credential(&self, id: &str, expected: &str, new_hash: String) -> CoreResult<bool> {
            self.0.replace_credential(id, expected, new_hash).await
        }
        async fn delete(&self, id: &str) -> CoreResult<()> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_save_is_distinct_and_leaves_role() {
        let inner = InMemoryUserStore::with_users([user("root", Role::SuperAdmin), user("dev", Role::Developer)]);
        let store = Arc::new(FailingWrites(inner.clone()));
        let admin = RoleAdministration::new(store, PermissionEvaluator::standard());
        let root = Actor::new("root", Role::SuperAdmin);

        let err = admin.change_role(&root, "dev", Role::Manager).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(!err.is_forbidden());
        assert_eq!(inner.find_by_id("dev").await.unwrap().unwrap().role, Role::Developer);
    }

    #[tokio::test]
    async fn test_failed_edit_stores_nothing() {
        let inner = InMemoryUserStore::with_users([user("root", Role::SuperAdmin), user("dev", Role::Developer)]);
        let admin = RoleAdministration::new(Arc::new(FailingWrites(inner.clone())), PermissionEvaluator::standard());
        let root = Actor::new("root", Role::SuperAdmin);

        let err = admin
            .edit_user(&root, "dev", |u| {
                u.name = "Renamed".to_string();
                u.is_active = false;
                u.role = Role::Qa;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        let stored = inner.find_by_id("dev").await.unwrap().unwrap();
        assert_eq!(stored.name, "dev");
        assert!(stored.is_active);
        assert_eq!(stored.role, Role::Developer);
    }

    #[tokio::test]
    async fn test_manager_cannot_edit_super_admin_profile() {
        let (store, audit, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);

        let err = admin
            .edit_user(&manager, "root", |u| {
                u.password_hash = "taken".to_string();
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(err.is_forbidden());
        assert_eq!(store.find_by_id("root").await.unwrap().unwrap().password_hash, "hash");
        assert!(audit.has_entry(|l| l.action == AuditAction::AccessDenied));
    }

    #[tokio::test]
    async fn test_edit_applies_profile_and_role_together() {
        let (store, audit, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);

        let user = admin
            .edit_user(&manager, "dev", |u| {
                u.name = "Dana".to_string();
                u.role = Role::Qa;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!((user.name.as_str(), user.role), ("Dana", Role::Qa));
        assert_eq!(store.find_by_id("dev").await.unwrap().unwrap().role, Role::Qa);
        assert_eq!(audit.entries_for_action(AuditAction::PermissionChange).len(), 1);
    }

    #[tokio::test]
    async fn test_self_edit_allows_profile_but_not_role() {
        let (_, _, admin) = setup();
        let manager = Actor::new("boss", Role::Manager);

        let user = admin
            .edit_user(&manager, "boss", |u| {
                u.name = "Boss".to_string();
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(user.name, "Boss");

        let err = admin
            .edit_user(&manager, "boss", |u| {
                u.role = Role::SuperAdmin;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }
}
