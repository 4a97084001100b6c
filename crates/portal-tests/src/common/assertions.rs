// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Assertion helpers with informative failure messages.

use axum::http::StatusCode;

use portal_core::audit::{AuditAction, InMemoryAuditLogger};
use portal_session::{GuardOutcome, Route};

use super::harness::TestResponse;

/// Asserts an error response with the given status and code.
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) {
    assert_eq!(
        response.status, status,
        "unexpected status, body: {}",
        response.body
    );
    assert_eq!(
        response.error_code(),
        Some(code),
        "unexpected error code, body: {}",
        response.body
    );
}

/// Asserts a denied audit entry for `action` exists.
pub fn assert_denied_audit(audit: &InMemoryAuditLogger, action: AuditAction) {
    assert!(
        audit.has_entry(|entry| entry.action == action && entry.result.is_denied()),
        "no denied {:?} entry among {} audit entries",
        action,
        audit.len()
    );
}

/// Asserts a redirect to `target`.
pub fn assert_redirect(outcome: &GuardOutcome, target: &Route) {
    assert_eq!(
        outcome.redirect_target(),
        Some(target),
        "expected redirect to {}, got {:?}",
        target.as_str(),
        outcome
    );
}
