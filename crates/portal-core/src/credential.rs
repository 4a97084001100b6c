// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential verification.
//!
//! Verification is a two-phase operation:
//!
//! 1. [`CredentialVerifier::verify`] is read-only. It compares the candidate
//!    against the stored credential and, when the stored value is a legacy
//!    plaintext password that matched, returns a [`PendingMigration`]
//!    carrying a freshly hashed replacement.
//! 2. [`CredentialVerifier::migrate`] writes the replacement through the
//!    store. The write is a compare-and-set on the legacy value, so running
//!    it twice is harmless, and a failed write never fails the login.
//!
//! [`CredentialVerifier::verify_and_migrate`] runs both phases and is what
//! the login flow uses.
//!
//! Callers only ever see "ok" or "not ok": an unknown email, a deactivated
//! account and a wrong password are indistinguishable.

use std::fmt;
use std::sync::Arc;

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, AuditLogger};
use crate::error::{CoreError, CoreResult};
use crate::store::UserStore;
use crate::user::{normalize_email, User};

// =============================================================================
// Hashing
// =============================================================================

/// Hashes a password with Argon2 and a random 16-byte salt.
///
/// The result is a PHC string (`$argon2id$...`).
pub fn hash_password(password: &str) -> CoreResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| CoreError::hashing(format!("salt generation failed: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CoreError::hashing(format!("salt encoding failed: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::hashing(e.to_string()))
}

// =============================================================================
// StoredCredential
// =============================================================================

/// Classification of a stored credential value.
#[derive(Debug)]
pub enum StoredCredential<'a> {
    /// A PHC-format hash.
    Hashed(PasswordHash<'a>),
    /// A plaintext password from before hashing was introduced. Any
    /// non-empty value that does not parse as a PHC string, including one
    /// that starts with `$`.
    LegacyPlaintext(&'a str),
    /// An empty value. Never matches anything.
    Unsupported,
}

impl<'a> StoredCredential<'a> {
    /// Classifies a stored credential.
    pub fn classify(stored: &'a str) -> Self {
        if stored.is_empty() {
            return StoredCredential::Unsupported;
        }
        match PasswordHash::new(stored) {
            Ok(hash) => StoredCredential::Hashed(hash),
            _ => StoredCredential::LegacyPlaintext(stored),
        }
    }

    /// Returns `true` if this is a legacy plaintext value.
    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredCredential::LegacyPlaintext(_))
    }

    /// Compares `candidate` against this credential.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            StoredCredential::Hashed(hash) => Argon2::default()
                .verify_password(candidate.as_bytes(), hash)
                .is_ok(),
            StoredCredential::LegacyPlaintext(stored) => {
                constant_time_eq(stored.as_bytes(), candidate.as_bytes())
            }
            StoredCredential::Unsupported => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// =============================================================================
// Verification
// =============================================================================

/// A replacement hash for a legacy plaintext credential.
#[derive(Clone)]
pub struct PendingMigration {
    /// The user whose credential is migrated.
    pub user_id: String,
    legacy: String,
    replacement_hash: String,
}

impl PendingMigration {
    /// Returns the hash that will replace the legacy value.
    pub fn replacement_hash(&self) -> &str {
        &self.replacement_hash
    }
}

impl fmt::Debug for PendingMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMigration")
            .field("user_id", &self.user_id)
            .field("legacy", &"[REDACTED]")
            .finish()
    }
}

/// Result of a credential check.
#[derive(Debug, Clone)]
pub struct Verification {
    user: Option<User>,
    migration: Option<PendingMigration>,
}

impl Verification {
    fn denied() -> Self {
        Self {
            user: None,
            migration: None,
        }
    }

    fn granted(user: User, migration: Option<PendingMigration>) -> Self {
        Self {
            user: Some(user),
            migration,
        }
    }

    /// Returns `true` if the credentials matched an active user.
    pub fn ok(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the verified user.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Consumes the verification, returning the verified user.
    pub fn into_user(self) -> Option<User> {
        self.user
    }

    /// Returns the pending legacy migration, if any.
    pub fn migration(&self) -> Option<&PendingMigration> {
        self.migration.as_ref()
    }

    /// Takes the pending legacy migration out of this verification.
    pub fn take_migration(&mut self) -> Option<PendingMigration> {
        self.migration.take()
    }
}

/// Outcome of the migration phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The legacy value was replaced by the hash.
    Migrated,
    /// The credential had already changed; nothing was written.
    AlreadyMigrated,
    /// The write failed. The login is unaffected.
    Failed {
        /// Failure description.
        reason: String,
    },
}

// =============================================================================
// CredentialVerifier
// =============================================================================

/// Verifies email/password pairs against a [`UserStore`].
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn UserStore>,
    audit_logger: Option<Arc<dyn AuditLogger>>,
}

impl CredentialVerifier {
    /// Creates a verifier over `store`.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            audit_logger: None,
        }
    }

    /// Records credential migrations to `logger`.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    /// Phase one: checks the candidate password.
    ///
    /// Fails with `Validation` when either input is empty and with `Storage`
    /// when the lookup fails. A credential mismatch is `Ok` with
    /// [`Verification::ok`] returning `false`.
    pub async fn verify(&self, email: &str, candidate: &str) -> CoreResult<Verification> {
        let email = normalize_email(email);
        if email.is_empty() || candidate.is_empty() {
            return Err(CoreError::validation("Email and password required"));
        }

        let user = match self.store.find_by_email(&email).await? {
            Some(user) if user.is_active => user,
            Some(user) => {
                debug!(user_id = %user.id, "Login attempt for inactive user");
                return Ok(Verification::denied());
            }
            None => {
                debug!("Login attempt for unknown email");
                return Ok(Verification::denied());
            }
        };

        let (matched, legacy) = {
            let stored = StoredCredential::classify(&user.password_hash);
            (stored.matches(candidate), stored.is_legacy())
        };

        if !matched {
            debug!(user_id = %user.id, "Credential mismatch");
            return Ok(Verification::denied());
        }

        let migration = if legacy {
            match hash_password(candidate) {
                Ok(replacement_hash) => Some(PendingMigration {
                    user_id: user.id.clone(),
                    legacy: user.password_hash.clone(),
                    replacement_hash,
                }),
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "Could not prepare credential migration");
                    None
                }
            }
        } else {
            None
        };

        Ok(Verification::granted(user, migration))
    }

    /// Phase two: replaces a legacy plaintext credential with its hash.
    ///
    /// Never returns an error; failures are logged and reported in the outcome.
    pub async fn migrate(&self, migration: PendingMigration) -> MigrationOutcome {
        let user_id = migration.user_id.clone();
        let outcome = match self
            .store
            .replace_credential(&user_id, &migration.legacy, migration.replacement_hash)
            .await
        {
            Ok(true) => {
                info!(user_id = %user_id, "Migrated legacy plaintext credential");
                MigrationOutcome::Migrated
            }
            Ok(false) => {
                debug!(user_id = %user_id, "Credential already migrated");
                MigrationOutcome::AlreadyMigrated
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Credential migration failed");
                MigrationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if let Some(logger) = &self.audit_logger {
            if let Err(e) = logger
                .log(AuditLog::credential_migration(&user_id, &outcome))
                .await
            {
                warn!(error = %e, "Failed to record credential migration");
            }
        }

        outcome
    }

    /// Runs both phases before returning.
    pub async fn verify_and_migrate(&self, email: &str, candidate: &str) -> CoreResult<Verification> {
        let mut verification = self.verify(email, candidate).await?;
        if let Some(migration) = verification.take_migration() {
            self.migrate(migration).await;
        }
        Ok(verification)
    }
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("store", &self.store.name())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
