// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Navigation guards.
//!
//! A guard looks at the session and the requested route and returns a
//! navigation decision. Guards never fail: an under-privileged user is
//! redirected, an unresolved session is pending.

use std::fmt::Debug;
use std::sync::Arc;

use portal_core::{PermissionEvaluator, Role};
use tracing::debug;

use crate::route::{landing_page_for, Capability, Route};
use crate::session::Session;

// =============================================================================
// GuardOutcome
// =============================================================================

/// Decision of a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Continue to the route.
    Allow,
    /// The session is still resolving; render a neutral placeholder.
    Pending,
    /// Navigate elsewhere instead.
    Redirect(Route),
}

impl GuardOutcome {
    /// Returns `true` for [`GuardOutcome::Allow`].
    pub fn is_allow(&self) -> bool {
        matches!(self, GuardOutcome::Allow)
    }

    /// Returns the redirect target, if any.
    pub fn redirect_target(&self) -> Option<&Route> {
        match self {
            GuardOutcome::Redirect(route) => Some(route),
            _ => None,
        }
    }
}

// =============================================================================
// Guard
// =============================================================================

/// A navigation predicate.
pub trait Guard: Send + Sync + Debug {
    /// Evaluates the guard.
    fn evaluate(&self, session: &Session, route: &Route) -> GuardOutcome;

    /// Returns the guard name for logging.
    fn name(&self) -> &'static str;
}

/// Requires an authenticated session.
///
/// The reporting-only role is pinned to its landing page: any other path
/// redirects there.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationGuard;

impl Guard for AuthenticationGuard {
    fn evaluate(&self, session: &Session, route: &Route) -> GuardOutcome {
        if session.is_loading() {
            return GuardOutcome::Pending;
        }
        match session.role() {
            None => GuardOutcome::Redirect(Route::LOGIN),
            Some(role) if role.is_reporting_only() => {
                let landing = landing_page_for(role);
                if route.matches(landing.as_str()) {
                    GuardOutcome::Allow
                } else {
                    GuardOutcome::Redirect(landing)
                }
            }
            Some(_) => GuardOutcome::Allow,
        }
    }

    fn name(&self) -> &'static str {
        "authentication"
    }
}

/// Admits only the listed roles. Others go to the dashboard, not to login.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allow: Vec<Role>,
}

impl RoleGuard {
    /// Creates a guard admitting `allow`.
    pub fn new(allow: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allow: allow.into_iter().collect(),
        }
    }

    /// Returns the admitted roles.
    pub fn allowed(&self) -> &[Role] {
        &self.allow
    }
}

impl Guard for RoleGuard {
    fn evaluate(&self, session: &Session, _route: &Route) -> GuardOutcome {
        if session.is_loading() {
            return GuardOutcome::Pending;
        }
        match session.role() {
            Some(role) if self.allow.contains(&role) => GuardOutcome::Allow,
            _ => GuardOutcome::Redirect(Route::DASHBOARD),
        }
    }

    fn name(&self) -> &'static str {
        "role"
    }
}

/// Requires access to the capability's resource.
///
/// Handles the pending state itself, so it is safe to use without an
/// authentication guard in front of it.
#[derive(Debug, Clone)]
pub struct CapabilityGuard {
    capability: Capability,
    evaluator: PermissionEvaluator,
}

impl CapabilityGuard {
    /// Creates a guard for `capability`.
    pub fn new(capability: Capability, evaluator: PermissionEvaluator) -> Self {
        Self {
            capability,
            evaluator,
        }
    }
}

impl Guard for CapabilityGuard {
    fn evaluate(&self, session: &Session, _route: &Route) -> GuardOutcome {
        if session.is_loading() {
            return GuardOutcome::Pending;
        }
        if self.capability.granted_to(&self.evaluator, session.role()) {
            GuardOutcome::Allow
        } else {
            GuardOutcome::Redirect(Route::DASHBOARD)
        }
    }

    fn name(&self) -> &'static str {
        "capability"
    }
}

// =============================================================================
// GuardPipeline
// =============================================================================

/// Ordered guards; the first non-Allow outcome wins.
#[derive(Debug, Clone, Default)]
pub struct GuardPipeline {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardPipeline {
    /// Creates an empty pipeline, which allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a guard.
    pub fn then(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Evaluates the guards in order.
    pub fn evaluate(&self, session: &Session, route: &Route) -> GuardOutcome {
        for guard in &self.guards {
            let outcome = guard.evaluate(session, route);
            if !outcome.is_allow() {
                debug!(guard = guard.name(), route = %route, outcome = ?outcome, "Navigation stopped");
                return outcome;
            }
        }
        GuardOutcome::Allow
    }

    /// Returns the number of guards.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Returns `true` if the pipeline has no guards.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use portal_core::User;

    async fn session_as(role: Option<Role>) -> Session {
        let mut session = Session::restored(Arc::new(MemoryStorage::new())).await;
        if let Some(role) = role {
            let user = User::new("T", "t@portal.test", "x", role).summary();
            session.login(user, "tok").await.unwrap();
        }
        session
    }

    fn loading_session() -> Session {
        let mut session = Session::new(Arc::new(MemoryStorage::new()));
        session.begin_restore();
        session
    }

    #[tokio::test]
    async fn test_authentication_guard() {
        let guard = AuthenticationGuard;

        assert_eq!(guard.evaluate(&loading_session(), &Route::TASKS), GuardOutcome::Pending);
        assert_eq!(
            guard.evaluate(&session_as(None).await, &Route::TASKS),
            GuardOutcome::Redirect(Route::LOGIN)
        );
        assert_eq!(
            guard.evaluate(&session_as(Some(Role::Qa)).await, &Route::TASKS),
            GuardOutcome::Allow
        );
    }

    #[tokio::test]
    async fn test_reporting_role_is_pinned() {
        let guard = AuthenticationGuard;
        let analyst = session_as(Some(Role::BusinessAnalyst)).await;

        assert_eq!(
            guard.evaluate(&analyst, &Route::DASHBOARD),
            GuardOutcome::Redirect(Route::REPORTS)
        );
        assert_eq!(guard.evaluate(&analyst, &Route::REPORTS), GuardOutcome::Allow);
    }

    #[tokio::test]
    async fn test_role_guard() {
        let guard = RoleGuard::new([Role::SuperAdmin, Role::Manager]);

        assert_eq!(guard.evaluate(&loading_session(), &Route::ADMIN), GuardOutcome::Pending);
        assert_eq!(
            guard.evaluate(&session_as(Some(Role::Hr)).await, &Route::ADMIN),
            GuardOutcome::Redirect(Route::DASHBOARD)
        );
        assert_eq!(
            guard.evaluate(&session_as(None).await, &Route::ADMIN),
            GuardOutcome::Redirect(Route::DASHBOARD)
        );
        assert_eq!(
            guard.evaluate(&session_as(Some(Role::Manager)).await, &Route::ADMIN),
            GuardOutcome::Allow
        );
    }

    #[tokio::test]
    async fn test_capability_guard() {
        let guard = CapabilityGuard::new(Capability::ViewUsers, PermissionEvaluator::standard());

        assert_eq!(guard.evaluate(&loading_session(), &Route::USERS), GuardOutcome::Pending);
        assert_eq!(
            guard.evaluate(&session_as(Some(Role::Developer)).await, &Route::USERS),
            GuardOutcome::Redirect(Route::DASHBOARD)
        );
        assert_eq!(
            guard.evaluate(&session_as(Some(Role::Hr)).await, &Route::USERS),
            GuardOutcome::Allow
        );
    }

    #[tokio::test]
    async fn test_pipeline_short_circuits() {
        let pipeline = GuardPipeline::new()
            .then(AuthenticationGuard)
            .then(RoleGuard::new([Role::SuperAdmin]));
        assert_eq!(pipeline.len(), 2);

        assert_eq!(
            pipeline.evaluate(&session_as(None).await, &Route::ADMIN_ROLES),
            GuardOutcome::Redirect(Route::LOGIN)
        );
        assert_eq!(
            pipeline.evaluate(&session_as(Some(Role::Manager)).await, &Route::ADMIN_ROLES),
            GuardOutcome::Redirect(Route::DASHBOARD)
        );
        assert!(pipeline
            .evaluate(&session_as(Some(Role::SuperAdmin)).await, &Route::ADMIN_ROLES)
            .is_allow());
        assert!(GuardPipeline::new()
            .evaluate(&session_as(None).await, &Route::ADMIN)
            .is_allow());
    }
}
