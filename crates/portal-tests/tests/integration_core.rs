// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Core Integration Tests
//!
//! Integration tests for portal-core:
//!
//! - Role registry and permission evaluation
//! - Credential verification and legacy migration
//! - Role administration
//! - Demo seeding
//!
//! ## Test Categories
//!
//! - `test_rbac_*`: Registry and evaluator tests
//! - `test_credential_*`: Verification and migration tests
//! - `test_admin_*`: Role administration tests
//! - `test_seed_*`: Seeding tests

use std::sync::Arc;

use portal_core::audit::{ActionResult, AuditAction, InMemoryAuditLogger};
use portal_core::{
    seed_demo_users, Action, Actor, CoreError, CredentialVerifier, InMemoryUserStore,
    MigrationOutcome, PermissionEvaluator, Resource, Role, RoleAdministration, RoleChange,
    RoleRegistry, UserStore, DEMO_USERS,
};
use portal_tests::common::*;

// =============================================================================
// RBAC
// =============================================================================

#[test]
fn test_rbac_hierarchy_is_strictly_ordered() {
    let registry = RoleRegistry::standard();
    let ranked = registry.ranked_roles();

    assert_eq!(ranked.len(), Role::ALL.len());
    assert_eq!(ranked.first(), Some(&Role::SuperAdmin));
    assert_eq!(ranked.last(), Some(&Role::BusinessAnalyst));
    assert!(ranked
        .windows(2)
        .all(|w| registry.hierarchy_level(w[0]) > registry.hierarchy_level(w[1])));
}

#[test]
fn test_rbac_qa_permissions() {
    let evaluator = PermissionEvaluator::standard();

    assert!(evaluator.has_permission(Role::Qa, Resource::Tasks, Action::Update));
    assert!(evaluator.has_permission(Role::Qa, Resource::Projects, Action::Read));
    assert!(!evaluator.has_permission(Role::Qa, Resource::Projects, Action::Create));
    assert!(!evaluator.can_access_resource(Role::Qa, Resource::Users));
    assert!(!evaluator.can_access_resource(Role::Qa, Resource::Admin));
}

#[test]
fn test_rbac_unknown_role_has_nothing() {
    let evaluator = PermissionEvaluator::standard();

    for resource in [Resource::Users, Resource::Reports, Resource::Admin] {
        assert!(!evaluator.can_access_resource(None, resource));
    }
    assert!(!evaluator.has_permission(None, Resource::Reports, Action::Read));
    assert!(RoleRegistry::standard().permissions_for_name("INTERN").is_empty());
}

#[test]
fn test_rbac_hierarchy_override() {
    let evaluator = PermissionEvaluator::standard();

    assert!(evaluator.can_edit_user(Role::Manager, Role::Hr));
    assert!(!evaluator.can_edit_user(Role::Manager, Role::Manager));
    assert!(!evaluator.can_edit_user(Role::Manager, Role::SuperAdmin));
    assert!(evaluator.can_edit_user(Role::SuperAdmin, Role::SuperAdmin));
    assert!(!evaluator.can_act_on_lower_rank(Role::Hr, Role::Hr, false));
}

#[test]
fn test_rbac_inactive_user_holds_no_permissions() {
    let evaluator = PermissionEvaluator::standard();
    let active = second_super_admin();
    let inactive = second_super_admin().with_active(false);

    assert!(evaluator.user_has_permission(&active, Resource::Users, Action::Delete));
    assert!(!evaluator.user_has_permission(&inactive, Resource::Users, Action::Delete));
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_credential_hashed_login() {
    init_test_logging();
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let verifier = CredentialVerifier::new(store);
    let qa = demo(Role::Qa);

    let ok = verifier.verify(qa.email, qa.password).await.unwrap();
    assert!(ok.ok());
    assert!(ok.migration().is_none());
    assert_eq!(ok.user().map(|u| u.role), Some(Role::Qa));

    let wrong = verifier.verify(qa.email, "wrong").await.unwrap();
    assert!(!wrong.ok());
}

#[tokio::test]
async fn test_credential_email_is_normalized() {
    let store = Arc::new(InMemoryUserStore::with_users([legacy_user()]));
    let verifier = CredentialVerifier::new(store);

    let verification = verifier
        .verify("  LEGACY@Portal.Test ", LEGACY_PASSWORD)
        .await
        .unwrap();
    assert!(verification.ok());
}

#[tokio::test]
async fn test_credential_empty_input_is_validation_error() {
    let store = Arc::new(InMemoryUserStore::with_users([legacy_user()]));
    let verifier = CredentialVerifier::new(store);

    let err = verifier.verify("", "x").await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    let err = verifier.verify(LEGACY_EMAIL, "").await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn test_credential_inactive_user_is_denied() {
    let store = Arc::new(InMemoryUserStore::with_users([legacy_user().with_active(false)]));
    let verifier = CredentialVerifier::new(store);

    let verification = verifier.verify(LEGACY_EMAIL, LEGACY_PASSWORD).await.unwrap();
    assert!(!verification.ok());
}

#[tokio::test]
async fn test_credential_legacy_migration() {
    init_test_logging();
    let store = Arc::new(InMemoryUserStore::with_users([legacy_user()]));
    let audit = Arc::new(InMemoryAuditLogger::new());
    let verifier = CredentialVerifier::new(store.clone()).with_audit_logger(audit.clone());

    let verification = verifier
        .verify_and_migrate(LEGACY_EMAIL, LEGACY_PASSWORD)
        .await
        .unwrap();
    assert!(verification.ok());

    let stored = store.credential_of(LEGACY_USER_ID).unwrap();
    assert!(stored.starts_with("$argon2"));
    assert_ne!(stored, LEGACY_PASSWORD);
    assert_eq!(audit.entries_for_action(AuditAction::CredentialMigration).len(), 1);

    // The migrated credential keeps working and is not migrated twice.
    let again = verifier
        .verify_and_migrate(LEGACY_EMAIL, LEGACY_PASSWORD)
        .await
        .unwrap();
    assert!(again.ok());
    assert_eq!(store.credential_of(LEGACY_USER_ID).unwrap(), stored);
    assert_eq!(audit.entries_for_action(AuditAction::CredentialMigration).len(), 1);
}

#[tokio::test]
async fn test_credential_concurrent_migration_is_single() {
    let store = Arc::new(InMemoryUserStore::with_users([legacy_user()]));
    let verifier = CredentialVerifier::new(store.clone());

    let mut first = verifier.verify(LEGACY_EMAIL, LEGACY_PASSWORD).await.unwrap();
    let mut second = verifier.verify(LEGACY_EMAIL, LEGACY_PASSWORD).await.unwrap();

    let a = verifier.migrate(first.take_migration().unwrap()).await;
    let b = verifier.migrate(second.take_migration().unwrap()).await;

    assert_eq!(a, MigrationOutcome::Migrated);
    assert_eq!(b, MigrationOutcome::AlreadyMigrated);
}

#[tokio::test]
async fn test_credential_migration_failure_keeps_login() {
    let store = MockUserStore::with_users([legacy_user()]);
    store.fail_credential_writes(true);
    let verifier = CredentialVerifier::new(store.clone());

    let verification = verifier
        .verify_and_migrate(LEGACY_EMAIL, LEGACY_PASSWORD)
        .await
        .unwrap();

    assert!(verification.ok());
    assert_eq!(
        store.inner().credential_of(LEGACY_USER_ID).as_deref(),
        Some(LEGACY_PASSWORD)
    );
}

#[tokio::test]
async fn test_credential_lookup_failure_is_storage_error() {
    let store = MockUserStore::with_users([legacy_user()]);
    store.fail_lookups(true);
    let verifier = CredentialVerifier::new(store);

    let err = verifier.verify(LEGACY_EMAIL, LEGACY_PASSWORD).await.unwrap_err();
    assert!(matches!(err, CoreError::Storage { .. }));
}

// =============================================================================
// Role Administration
// =============================================================================

fn admin_over(store: Arc<InMemoryUserStore>) -> (RoleAdministration, Arc<InMemoryAuditLogger>) {
    let audit = Arc::new(InMemoryAuditLogger::new());
    let admin = RoleAdministration::new(store, PermissionEvaluator::standard())
        .with_audit_logger(audit.clone());
    (admin, audit)
}

#[tokio::test]
async fn test_admin_manager_cannot_touch_super_admin() {
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let (admin, audit) = admin_over(store.clone());
    let manager = Actor::new("u_manager", Role::Manager);

    let err = admin
        .change_role(&manager, "u_super_admin", Role::Developer)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Forbidden { .. }));
    assert_denied_audit(&audit, AuditAction::PermissionChange);
    let target = store.find_by_id("u_super_admin").await.unwrap().unwrap();
    assert_eq!(target.role, Role::SuperAdmin);
}

#[tokio::test]
async fn test_admin_manager_demotes_lower_rank() {
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let (admin, audit) = admin_over(store.clone());
    let manager = Actor::new("u_manager", Role::Manager);

    let change = admin
        .change_role(&manager, "u_dev", Role::Qa)
        .await
        .unwrap();

    match change {
        RoleChange::Changed { user, previous } => {
            assert_eq!(previous, Role::Developer);
            assert_eq!(user.role, Role::Qa);
        }
        other => panic!("expected a change, got {:?}", other),
    }
    assert!(audit.has_entry(|e| {
        e.action == AuditAction::PermissionChange && e.result == ActionResult::Success
    }));
}

#[tokio::test]
async fn test_admin_super_admin_changes_super_admin() {
    let store = Arc::new(InMemoryUserStore::with_users(
        demo_users().into_iter().chain([second_super_admin()]),
    ));
    let (admin, _) = admin_over(store.clone());
    let root = Actor::new("u_super_admin", Role::SuperAdmin);

    let change = admin
        .change_role(&root, "u_super_admin_2", Role::Manager)
        .await
        .unwrap();

    assert!(matches!(change, RoleChange::Changed { previous: Role::SuperAdmin, .. }));
}

#[tokio::test]
async fn test_admin_same_role_is_unchanged() {
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let (admin, audit) = admin_over(store);
    let root = Actor::new("u_super_admin", Role::SuperAdmin);

    let change = admin.change_role(&root, "u_qa", Role::Qa).await.unwrap();

    assert!(matches!(change, RoleChange::Unchanged { .. }));
    assert!(audit.is_empty());
}

#[tokio::test]
async fn test_admin_change_survives_audit_failure() {
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let sink = FailingAuditLogger::new();
    let admin = RoleAdministration::new(store.clone(), PermissionEvaluator::standard())
        .with_audit_logger(sink.clone());
    let root = Actor::new("u_super_admin", Role::SuperAdmin);

    let change = admin.change_role(&root, "u_dev", Role::Qa).await.unwrap();

    assert!(change.is_changed());
    assert_eq!(sink.attempts(), 1);
    let stored = store.find_by_id("u_dev").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Qa);
}

#[tokio::test]
async fn test_admin_unknown_target() {
    let store = Arc::new(InMemoryUserStore::with_users(demo_users()));
    let (admin, _) = admin_over(store);
    let root = Actor::new("u_super_admin", Role::SuperAdmin);

    let err = admin
        .change_role(&root, "u_missing", Role::Qa)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

// =============================================================================
// Seeding
// =============================================================================

#[tokio::test]
async fn test_seed_is_idempotent() {
    let store = InMemoryUserStore::new();

    let first = seed_demo_users(&store).await.unwrap();
    assert_eq!(first.created, DEMO_USERS.len());

    let second = seed_demo_users(&store).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, DEMO_USERS.len());
    assert_eq!(store.len(), DEMO_USERS.len());
}
