// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client routes, capabilities and the route table.

use std::borrow::Cow;
use std::fmt;

use portal_core::{PermissionEvaluator, Resource, Role};
use serde::{Deserialize, Serialize};

use crate::guard::{
    AuthenticationGuard, CapabilityGuard, GuardOutcome, GuardPipeline, RoleGuard,
};
use crate::session::Session;

// =============================================================================
// Route
// =============================================================================

/// A client navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Cow<'static, str>);

impl Route {
    /// Root; redirects to the dashboard.
    pub const ROOT: Route = Route::from_static("/");
    /// Login page.
    pub const LOGIN: Route = Route::from_static("/login");
    /// Dashboard; the default authenticated landing page.
    pub const DASHBOARD: Route = Route::from_static("/dashboard");
    /// Project list.
    pub const PROJECTS: Route = Route::from_static("/projects");
    /// Task list.
    pub const TASKS: Route = Route::from_static("/tasks");
    /// Reports.
    pub const REPORTS: Route = Route::from_static("/reports");
    /// Personal settings.
    pub const SETTINGS: Route = Route::from_static("/settings");
    /// User administration.
    pub const USERS: Route = Route::from_static("/users");
    /// Administration dashboard.
    pub const ADMIN: Route = Route::from_static("/admin");
    /// Role administration.
    pub const ADMIN_ROLES: Route = Route::from_static("/admin/roles");
    /// Email-to-role mappings.
    pub const ADMIN_EMAIL_MAPPINGS: Route = Route::from_static("/admin/email-mappings");
    /// Authentication demo page.
    pub const ADMIN_AUTH_DEMO: Route = Route::from_static("/admin/auth-demo");

    /// Creates a route from a static path.
    pub const fn from_static(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Creates a route from any path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(Cow::Owned(path.into()))
    }

    /// Returns the path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Matches against a pattern where `:name` segments match any one segment.
    pub fn matches(&self, pattern: &str) -> bool {
        let path = normalize(self.as_str());
        let pattern = normalize(pattern);

        let mut path_segments = path.split('/');
        let mut pattern_segments = pattern.split('/');
        loop {
            match (path_segments.next(), pattern_segments.next()) {
                (None, None) => return true,
                (Some(seg), Some(pat)) if pat.starts_with(':') && !seg.is_empty() => {}
                (Some(seg), Some(pat)) if seg == pat => {}
                _ => return false,
            }
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

// =============================================================================
// Capability
// =============================================================================

/// A coarse, resource-level access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    /// Open the user list.
    ViewUsers,
    /// Open projects.
    ViewProjects,
    /// Open tasks.
    ViewTasks,
    /// Open reports.
    ViewReports,
    /// Open settings.
    ViewSettings,
    /// Open the administration area.
    ViewAdmin,
}

impl Capability {
    /// All capabilities.
    pub const ALL: [Capability; 6] = [
        Capability::ViewUsers,
        Capability::ViewProjects,
        Capability::ViewTasks,
        Capability::ViewReports,
        Capability::ViewSettings,
        Capability::ViewAdmin,
    ];

    /// Returns the resource this capability checks.
    pub fn resource(&self) -> Resource {
        match self {
            Capability::ViewUsers => Resource::Users,
            Capability::ViewProjects => Resource::Projects,
            Capability::ViewTasks => Resource::Tasks,
            Capability::ViewReports => Resource::Reports,
            Capability::ViewSettings => Resource::Settings,
            Capability::ViewAdmin => Resource::Admin,
        }
    }

    /// Returns `true` if `role` holds any permission on the resource.
    pub fn granted_to(&self, evaluator: &PermissionEvaluator, role: impl Into<Option<Role>>) -> bool {
        evaluator.can_access_resource(role, self.resource())
    }
}

/// Returns the page a role lands on after login.
pub fn landing_page_for(role: impl Into<Option<Role>>) -> Route {
    match role.into() {
        Some(Role::SuperAdmin | Role::Manager) | None => Route::DASHBOARD,
        Some(Role::Developer | Role::Qa | Role::Designer) => Route::PROJECTS,
        Some(Role::Hr | Role::BusinessAnalyst) => Route::REPORTS,
    }
}

// =============================================================================
// RouteTable
// =============================================================================

/// What a matched route does.
#[derive(Debug, Clone)]
pub enum RouteAccess {
    /// Reachable without a session.
    Public,
    /// Unconditional redirect.
    Redirect(Route),
    /// Gated by a guard pipeline.
    Guarded(GuardPipeline),
}

/// Maps path patterns to their access rules. The first match wins; paths
/// that match nothing go through the fallback pipeline, if one is set.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, RouteAccess)>,
    fallback: Option<GuardPipeline>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a public route.
    pub fn public(mut self, pattern: impl Into<String>) -> Self {
        self.entries.push((pattern.into(), RouteAccess::Public));
        self
    }

    /// Adds a redirect.
    pub fn redirect(mut self, pattern: impl Into<String>, to: Route) -> Self {
        self.entries.push((pattern.into(), RouteAccess::Redirect(to)));
        self
    }

    /// Adds a guarded route.
    pub fn guarded(mut self, pattern: impl Into<String>, pipeline: GuardPipeline) -> Self {
        self.entries.push((pattern.into(), RouteAccess::Guarded(pipeline)));
        self
    }

    /// Guards paths that match no entry.
    pub fn fallback(mut self, pipeline: GuardPipeline) -> Self {
        self.fallback = Some(pipeline);
        self
    }

    /// The portal's routes. Unknown paths need a session, so the client's
    /// not-found page is only shown to signed-in users.
    pub fn standard(evaluator: PermissionEvaluator) -> Self {
        let authenticated = || GuardPipeline::new().then(AuthenticationGuard);
        let with_roles = |roles: &[Role]| authenticated().then(RoleGuard::new(roles.iter().copied()));
        let admins = [Role::SuperAdmin, Role::Manager];
        let super_admins = [Role::SuperAdmin];

        Self::new()
            .public(Route::LOGIN.as_str())
            .redirect(Route::ROOT.as_str(), Route::DASHBOARD)
            .guarded(Route::DASHBOARD.as_str(), authenticated())
            .guarded(Route::PROJECTS.as_str(), authenticated())
            .guarded("/projects/:id", authenticated())
            .guarded(Route::TASKS.as_str(), authenticated())
            .guarded("/tasks/:id", authenticated())
            .guarded(Route::REPORTS.as_str(), authenticated())
            .guarded(Route::SETTINGS.as_str(), authenticated())
            .guarded(
                Route::USERS.as_str(),
                authenticated().then(CapabilityGuard::new(Capability::ViewUsers, evaluator)),
            )
            .guarded(Route::ADMIN.as_str(), with_roles(&admins))
            .guarded(Route::ADMIN_AUTH_DEMO.as_str(), with_roles(&admins))
            .guarded(Route::ADMIN_ROLES.as_str(), with_roles(&super_admins))
            .guarded(Route::ADMIN_EMAIL_MAPPINGS.as_str(), with_roles(&super_admins))
            .fallback(authenticated())
    }

    /// Finds the access rule for `route`.
    pub fn lookup(&self, route: &Route) -> Option<&RouteAccess> {
        self.entries
            .iter()
            .find(|(pattern, _)| route.matches(pattern))
            .map(|(_, access)| access)
    }

    /// Decides whether `session` may navigate to `route`.
    pub fn navigate(&self, session: &Session, route: &Route) -> GuardOutcome {
        match self.lookup(route) {
            None => match &self.fallback {
                Some(pipeline) => pipeline.evaluate(session, route),
                None => GuardOutcome::Allow,
            },
            Some(RouteAccess::Public) => GuardOutcome::Allow,
            Some(RouteAccess::Redirect(to)) => GuardOutcome::Redirect(to.clone()),
            Some(RouteAccess::Guarded(pipeline)) => pipeline.evaluate(session, route),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_matching() {
        assert!(Route::new("/projects/42").matches("/projects/:id"));
        assert!(Route::new("/projects/").matches("/projects"));
        assert!(Route::ROOT.matches("/"));
        assert!(!Route::new("/projects").matches("/projects/:id"));
        assert!(!Route::new("/projects/42/tasks").matches("/projects/:id"));
        assert!(!Route::new("/admin/roles").matches("/admin"));
    }

    #[test]
    fn test_landing_pages() {
        assert_eq!(landing_page_for(Role::SuperAdmin), Route::DASHBOARD);
        assert_eq!(landing_page_for(Role::Manager), Route::DASHBOARD);
        assert_eq!(landing_page_for(Role::Developer), Route::PROJECTS);
        assert_eq!(landing_page_for(Role::Qa), Route::PROJECTS);
        assert_eq!(landing_page_for(Role::Designer), Route::PROJECTS);
        assert_eq!(landing_page_for(Role::Hr), Route::REPORTS);
        assert_eq!(landing_page_for(Role::BusinessAnalyst), Route::REPORTS);
        assert_eq!(landing_page_for(None), Route::DASHBOARD);
    }

    #[test]
    fn test_capabilities() {
        let evaluator = PermissionEvaluator::standard();

        assert!(Capability::ViewUsers.granted_to(&evaluator, Role::Hr));
        assert!(!Capability::ViewUsers.granted_to(&evaluator, Role::Developer));
        assert!(Capability::ViewAdmin.granted_to(&evaluator, Role::Manager));
        assert!(!Capability::ViewAdmin.granted_to(&evaluator, Role::Hr));
        assert!(!Capability::ViewReports.granted_to(&evaluator, None));
    }

    #[test]
    fn test_capability_wire_names() {
        assert_eq!(
            serde_json::to_string(&Capability::ViewUsers).unwrap(),
            "\"VIEW_USERS\""
        );
    }

    #[test]
    fn test_standard_table_lookup() {
        let table = RouteTable::standard(PermissionEvaluator::standard());

        assert!(matches!(table.lookup(&Route::LOGIN), Some(RouteAccess::Public)));
        assert!(matches!(
            table.lookup(&Route::ROOT),
            Some(RouteAccess::Redirect(to)) if *to == Route::DASHBOARD
        ));
        assert!(matches!(
            table.lookup(&Route::new("/tasks/7")),
            Some(RouteAccess::Guarded(_))
        ));
        assert!(table.lookup(&Route::new("/nowhere")).is_none());
    }
}
