// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session error types.

use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The storage backend failed to read, write or remove.
    #[error("Session storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
    },

    /// The persisted value could not be encoded.
    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The operation needs an authenticated session.
    #[error("No authenticated session")]
    NotAuthenticated,
}

impl SessionError {
    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Storage { .. })
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
