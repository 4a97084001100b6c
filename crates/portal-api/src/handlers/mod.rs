// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: Liveness check
//! - [`auth`]: Login, current user and logout
//! - [`users`]: User administration

mod auth;
mod health;
mod users;

pub use auth::*;
pub use health::*;
pub use users::*;
