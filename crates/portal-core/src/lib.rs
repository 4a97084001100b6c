// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-core
//!
//! Access-control core for the project portal.
//!
//! This crate holds everything that decides *who may do what* and is shared
//! by the HTTP server and the client session crate:
//!
//! - **Role**: The fixed role enumeration and its wire names
//! - **Registry**: Immutable role table (hierarchy level + permissions)
//! - **Evaluator**: Permission and hierarchy checks over the registry
//! - **User / Store**: The user record and the async storage seam
//! - **Credential**: Password hashing and the two-phase legacy migration
//! - **Admin**: The role administration workflow
//! - **Seed**: First-run demo users
//! - **Audit**: Security audit logging
//!
//! ## Example
//!
//! ```rust
//! use portal_core::{Action, PermissionEvaluator, Resource, Role};
//!
//! let evaluator = PermissionEvaluator::standard();
//!
//! assert!(evaluator.has_permission(Role::Qa, Resource::Tasks, Action::Update));
//! assert!(!evaluator.has_permission(Role::Qa, Resource::Users, Action::Delete));
//! assert!(!evaluator.has_permission(None, Resource::Reports, Action::Read));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Access Model
// =============================================================================

pub mod error;
pub mod role;
pub mod registry;
pub mod evaluator;

// =============================================================================
// Users & Credentials
// =============================================================================

pub mod user;
pub mod store;
pub mod credential;
pub mod admin;
pub mod seed;

// =============================================================================
// Audit
// =============================================================================

pub mod audit;

// =============================================================================
// Re-exports
// =============================================================================

pub use admin::{Actor, RoleAdministration, RoleChange};
pub use credential::{
    hash_password, CredentialVerifier, MigrationOutcome, PendingMigration, StoredCredential,
    Verification,
};
pub use error::{CoreError, CoreResult};
pub use evaluator::PermissionEvaluator;
pub use registry::{RoleDefinition, RoleRegistry, RoleRegistryBuilder};
pub use role::{Action, Permission, Resource, Role};
pub use seed::{seed_demo_users, DemoUser, SeedReport, DEMO_USERS};
pub use store::{InMemoryUserStore, UserStore};
pub use user::{normalize_email, NewUser, User, UserPatch, UserSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
