// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit error types.

use thiserror::Error;

/// Failure of an audit sink.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The sink could not persist an entry.
    #[error("Audit write failed: {message}")]
    WriteFailed {
        /// Cause reported by the sink.
        message: String,
    },

    /// The sink is write-only.
    #[error("Audit sink '{sink}' cannot be queried")]
    QueryNotSupported {
        /// Sink name.
        sink: &'static str,
    },

    /// An entry field could not be encoded.
    #[error("Audit entry encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl AuditError {
    /// Creates a write failure.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
