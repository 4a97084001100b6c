// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client session state machine.
//!
//! ```text
//! Uninitialized --begin_restore--> Loading --finish_restore--> Authenticated
//!                                          \-----------------> Anonymous
//! Anonymous --login--> Authenticated --logout--> Anonymous
//! ```
//!
//! Every transition into `Authenticated` persists `{user, token}` before the
//! in-memory state changes, so guards never observe an authenticated session
//! whose credentials are not yet durable. Restore never fails: anything that
//! is not a complete, parseable pair resolves to `Anonymous`.

use std::fmt;
use std::sync::Arc;

use portal_core::{Role, UserSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::storage::SessionStorage;

/// Storage key of the persisted session.
pub const STORAGE_KEY: &str = "auth_state_v1";

// =============================================================================
// SessionState
// =============================================================================

/// Lifecycle state of a client session.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing has been read yet.
    #[default]
    Uninitialized,
    /// The persisted session is being read.
    Loading,
    /// A user and token are present.
    Authenticated {
        /// Cached user snapshot.
        user: UserSummary,
        /// Bearer token.
        token: String,
    },
    /// Resolved with no session.
    Anonymous,
}

impl SessionState {
    /// Returns `true` while the state is not yet resolved.
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Loading)
    }

    /// Returns `true` iff both a user and a token are present.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    /// Returns the cached user.
    pub fn user(&self) -> Option<&UserSummary> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Returns the bearer token.
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Returns the role of the cached user.
    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    fn label(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("user", &user.id)
                .field("role", &user.role)
                .field("token", &"[REDACTED]")
                .finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// The persisted form: a single JSON object.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: UserSummary,
    token: String,
}

impl PersistedSession {
    fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str::<PersistedSession>(raw) {
            Ok(persisted) if !persisted.token.trim().is_empty() => Some(persisted),
            Ok(_) => {
                debug!("Persisted session has an empty token");
                None
            }
            Err(e) => {
                debug!(error = %e, "Persisted session is not decodable");
                None
            }
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// A client session bound to a storage backend.
///
/// There is one session per client; it is constructed explicitly and owned
/// by whoever drives navigation.
pub struct Session {
    storage: Arc<dyn SessionStorage>,
    key: String,
    state: SessionState,
}

impl Session {
    /// Creates an uninitialized session over `storage`.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
            state: SessionState::Uninitialized,
        }
    }

    /// Uses a different storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Creates a session and restores it in one step.
    pub async fn restored(storage: Arc<dyn SessionStorage>) -> Self {
        let mut session = Self::new(storage);
        session.restore().await;
        session
    }

    /// Returns the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` iff both a user and a token are present.
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Returns `true` while restore has not resolved.
    pub fn is_loading(&self) -> bool {
        self.state.is_pending()
    }

    /// Returns the cached user.
    pub fn user(&self) -> Option<&UserSummary> {
        self.state.user()
    }

    /// Returns the bearer token.
    pub fn token(&self) -> Option<&str> {
        self.state.token()
    }

    /// Returns the role of the cached user.
    pub fn role(&self) -> Option<Role> {
        self.state.role()
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Moves `Uninitialized` to `Loading`. Other states are left alone.
    pub fn begin_restore(&mut self) {
        if self.state == SessionState::Uninitialized {
            self.state = SessionState::Loading;
        } else {
            debug!(state = self.state.label(), "begin_restore ignored");
        }
    }

    /// Resolves `Loading` from storage.
    ///
    /// A read failure, a missing value, invalid JSON or a partial pair all
    /// resolve to `Anonymous`; no error escapes.
    pub async fn finish_restore(&mut self) {
        if self.state != SessionState::Loading {
            debug!(state = self.state.label(), "finish_restore ignored");
            return;
        }

        let raw = match self.storage.get(&self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, backend = self.storage.name(), "Session storage read failed");
                None
            }
        };

        self.state = match raw.as_deref().and_then(PersistedSession::decode) {
            Some(PersistedSession { user, token }) => {
                debug!(user_id = %user.id, "Session restored");
                SessionState::Authenticated { user, token }
            }
            None => SessionState::Anonymous,
        };
    }

    /// Runs [`begin_restore`](Self::begin_restore) and
    /// [`finish_restore`](Self::finish_restore).
    pub async fn restore(&mut self) {
        self.begin_restore();
        self.finish_restore().await;
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Stores a successful login.
    ///
    /// The pair is persisted in one write before the state changes. On a
    /// persist failure the error is returned and the state is unchanged.
    pub async fn login(&mut self, user: UserSummary, token: impl Into<String>) -> SessionResult<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::storage("Refusing to persist an empty token"));
        }

        self.persist(&user, &token).await?;
        info!(user_id = %user.id, role = %user.role, "Session started");
        self.state = SessionState::Authenticated { user, token };
        Ok(())
    }

    /// Ends the session. Idempotent.
    ///
    /// Storage is cleared first. A removal failure is logged and the
    /// in-memory state is cleared regardless.
    pub async fn logout(&mut self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!(error = %e, backend = self.storage.name(), "Failed to clear persisted session");
        }
        if self.state.is_authenticated() {
            info!("Session ended");
        }
        self.state = SessionState::Anonymous;
    }

    /// Replaces the cached user, keeping the token.
    pub async fn set_user(&mut self, user: UserSummary) -> SessionResult<()> {
        let token = self
            .state
            .token()
            .ok_or(SessionError::NotAuthenticated)?
            .to_string();

        self.persist(&user, &token).await?;
        self.state = SessionState::Authenticated { user, token };
        Ok(())
    }

    /// Replaces the token, keeping the cached user.
    pub async fn set_token(&mut self, token: impl Into<String>) -> SessionResult<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::storage("Refusing to persist an empty token"));
        }
        let user = self
            .state
            .user()
            .ok_or(SessionError::NotAuthenticated)?
            .clone();

        self.persist(&user, &token).await?;
        self.state = SessionState::Authenticated { user, token };
        Ok(())
    }

    async fn persist(&self, user: &UserSummary, token: &str) -> SessionResult<()> {
        let value = serde_json::to_string(&PersistedSession {
            user: user.clone(),
            token: token.to_string(),
        })?;
        self.storage.set(&self.key, &value).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("storage", &self.storage.name())
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
