// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use chrono::{DateTime, Utc};
use portal_core::{Role, User};
use serde::{Deserialize, Serialize};

/// JWT claims for an authenticated portal user.
///
/// `role` deserializes only from the fixed role enumeration, so a token
/// carrying any other role string fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject: the user id.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// JWT ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Role at issuance.
    pub role: Role,

    /// Email at issuance.
    pub email: String,
}

impl Claims {
    /// Creates claims for `user`, issued at `issued_at` and valid for
    /// `expires_in_secs`.
    pub fn for_user(user: &User, issued_at: DateTime<Utc>, expires_in_secs: i64) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user.id.clone(),
            exp: iat + expires_in_secs,
            iat,
            iss: None,
            jti: None,
            role: user.role,
            email: user.email.clone(),
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Sets the token id.
    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn qa() -> User {
        User::new("QA Engineer", "qa@portal.test", "hash", Role::Qa).with_id("u_qa")
    }

    #[test]
    fn test_claims_for_user() {
        let now = Utc::now();
        let claims = Claims::for_user(&qa(), now, 604_800).with_issuer("portal");

        assert_eq!(claims.user_id(), "u_qa");
        assert_eq!(claims.role, Role::Qa);
        assert_eq!(claims.email, "qa@portal.test");
        assert_eq!(claims.exp - claims.iat, 604_800);
        assert_eq!(claims.iss.as_deref(), Some("portal"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_expiration() {
        let issued = Utc::now() - Duration::hours(2);
        let claims = Claims::for_user(&qa(), issued, 3600);

        assert!(claims.is_expired());
        assert_eq!(claims.issued_at().map(|t| t.timestamp()), Some(issued.timestamp()));
    }

    #[test]
    fn test_claims_reject_unknown_role() {
        let json = serde_json::json!({
            "sub": "u_x",
            "exp": 0,
            "iat": 0,
            "role": "ROOT",
            "email": "x@portal.test"
        });
        assert!(serde_json::from_value::<Claims>(json).is_err());
    }
}
