// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built users, secrets and configurations.

use std::sync::{Arc, OnceLock};

use portal_api::{ApiConfig, JwtConfig, TokenIssuer};
use portal_core::{DemoUser, Role, User, DEMO_USERS};

// =============================================================================
// Constants
// =============================================================================

/// Signing secret used by every test server.
pub const TEST_JWT_SECRET: &str = "portal-test-secret-key-that-is-long-enough-for-hs256";

/// Seven days in seconds.
pub const SEVEN_DAYS_SECS: i64 = 7 * 24 * 60 * 60;

/// Plaintext password of the legacy fixture user.
pub const LEGACY_PASSWORD: &str = "Legacy@123";

/// Id of the legacy fixture user.
pub const LEGACY_USER_ID: &str = "u_legacy";

/// Email of the legacy fixture user.
pub const LEGACY_EMAIL: &str = "legacy@portal.test";

// =============================================================================
// Users
// =============================================================================

static DEMO_RECORDS: OnceLock<Vec<User>> = OnceLock::new();

/// The demo accounts with hashed credentials.
///
/// Hashing runs once per test binary; callers get fresh clones.
pub fn demo_users() -> Vec<User> {
    DEMO_RECORDS
        .get_or_init(|| {
            DEMO_USERS
                .iter()
                .map(|d| d.to_user().expect("Failed to hash demo password"))
                .collect()
        })
        .clone()
}

/// The demo account holding `role`.
///
/// Panics for the business analyst, which has no demo account.
pub fn demo(role: Role) -> &'static DemoUser {
    DEMO_USERS
        .iter()
        .find(|d| d.role == role)
        .unwrap_or_else(|| panic!("No demo account for {}", role))
}

/// A user whose credential is still stored in plaintext.
pub fn legacy_user() -> User {
    User::new("Legacy User", LEGACY_EMAIL, LEGACY_PASSWORD, Role::Developer)
        .with_id(LEGACY_USER_ID)
        .with_department("Engineering")
}

/// A business analyst with a plaintext credential.
pub fn analyst_user() -> User {
    User::new("Analyst", "analyst@portal.test", "Analyst@123", Role::BusinessAnalyst)
        .with_id("u_analyst")
        .with_department("Business")
}

/// A second super admin.
pub fn second_super_admin() -> User {
    User::new("Deputy Admin", "deputy@portal.test", "Deputy@123", Role::SuperAdmin)
        .with_id("u_super_admin_2")
        .with_department("Admin")
}

// =============================================================================
// Configuration
// =============================================================================

/// JWT settings for tests.
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig::new(TEST_JWT_SECRET)
}

/// API configuration for tests.
pub fn test_api_config() -> ApiConfig {
    ApiConfig::default().with_jwt(test_jwt_config())
}

/// A token issuer over [`test_jwt_config`].
pub fn test_issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(test_jwt_config()).expect("Failed to create token issuer"))
}

/// A minimal valid YAML configuration.
pub fn minimal_yaml_config() -> String {
    format!("jwt:\n  secret: \"{}\"\n", TEST_JWT_SECRET)
}
