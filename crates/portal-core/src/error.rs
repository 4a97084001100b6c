// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core error types.
//!
//! The variants follow the error taxonomy of the access core: input
//! validation, authentication, authorization, missing records and
//! transient storage failures are all distinguishable so that callers can
//! message them differently.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the access-control core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or malformed input.
    #[error("Validation failed: {message}")]
    Validation {
        /// Error message.
        message: String,
    },

    /// Credential mismatch or inactive account.
    ///
    /// The message is intentionally uniform regardless of the root cause.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but the role or hierarchy does not allow the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message.
        message: String,
    },

    /// A record looked up by id does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// The missing resource.
        resource: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// A role string outside the fixed enumeration.
    #[error("Unknown role: {value}")]
    UnknownRole {
        /// The rejected value.
        value: String,
    },

    /// Persistence read/write failure. Retryable.
    #[error("Storage error: {message}")]
    Storage {
        /// Error message.
        message: String,
    },

    /// Password hashing failed.
    #[error("Hashing error: {message}")]
    Hashing {
        /// Error message.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an unknown role error.
    pub fn unknown_role(value: impl Into<String>) -> Self {
        Self::UnknownRole {
            value: value.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a hashing error.
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Storage { .. })
    }

    /// Returns `true` for authorization denials.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, CoreError::Forbidden { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(CoreError::storage("db down").is_retryable());
        assert!(!CoreError::forbidden("nope").is_retryable());
        assert!(!CoreError::InvalidCredentials.is_retryable());
    }

    #[test]
    fn test_invalid_credentials_message_is_uniform() {
        assert_eq!(CoreError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
