// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication module.
//!
//! This module provides:
//! - JWT issuance and validation
//! - Token claims
//! - The per-request authentication context

mod claims;
mod context;
mod jwt;

pub use claims::Claims;
pub use context::AuthContext;
pub use jwt::{IssuedToken, JwtConfig, TokenIssuer, DEFAULT_EXPIRATION_SECS};
