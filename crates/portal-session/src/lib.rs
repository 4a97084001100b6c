// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-session
//!
//! Client side of the portal's access control:
//!
//! - **Session**: the `{user, token}` state machine with durable persistence
//! - **Storage**: the key/value backend the session persists to
//! - **Guard**: navigation guards and their pipeline
//! - **Route**: client routes, capabilities, landing pages and the route table
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use portal_session::{MemoryStorage, Route, RouteTable, Session};
//!
//! let mut session = Session::restored(Arc::new(MemoryStorage::new())).await;
//! session.login(user, token).await?;
//!
//! let table = RouteTable::standard(PermissionEvaluator::standard());
//! let outcome = table.navigate(&session, &Route::ADMIN);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod guard;
pub mod route;
pub mod session;
pub mod storage;

pub use error::{SessionError, SessionResult};
pub use guard::{
    AuthenticationGuard, CapabilityGuard, Guard, GuardOutcome, GuardPipeline, RoleGuard,
};
pub use route::{landing_page_for, Capability, Route, RouteAccess, RouteTable};
pub use session::{Session, SessionState, STORAGE_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
