// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logging for security-relevant events.
//!
//! Logins, logouts, user provisioning, role changes and credential
//! migrations are recorded through the [`AuditLogger`] trait. The sink is an
//! external collaborator; three implementations ship with the crate:
//!
//! - [`InMemoryAuditLogger`]: queryable, for tests and development
//! - [`TracingAuditLogger`]: emits each entry as a structured `tracing` event
//! - [`NoOpAuditLogger`]: discards everything
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_core::audit::{AuditLog, AuditLogger, InMemoryAuditLogger};
//!
//! let logger = InMemoryAuditLogger::new();
//! logger.log(AuditLog::login("u_qa", None, true)).await?;
//! assert_eq!(logger.len(), 1);
//! ```

mod error;
mod memory_logger;
mod tracing_logger;
mod types;

pub use error::{AuditError, AuditResult};
pub use memory_logger::InMemoryAuditLogger;
pub use tracing_logger::TracingAuditLogger;
pub use types::{ActionResult, AuditAction, AuditFilter, AuditLog, AuditResource, AuditSeverity};

use async_trait::async_trait;

// =============================================================================
// Core Trait
// =============================================================================

/// Sink for security events.
///
/// Callers treat a failed write as non-fatal: it is logged and the
/// operation that produced the entry still completes.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Records one entry.
    async fn log(&self, entry: AuditLog) -> AuditResult<()>;

    /// Returns matching entries, newest last.
    ///
    /// Write-only sinks answer with [`AuditError::QueryNotSupported`].
    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>>;

    /// Writes out anything still buffered. Called once at shutdown.
    async fn flush(&self) -> AuditResult<()>;

    /// Returns the logger name for identification.
    fn name(&self) -> &str {
        "audit_logger"
    }

    /// Returns `true` if this logger supports querying.
    fn supports_query(&self) -> bool {
        false
    }
}

// =============================================================================
// No-Op Logger
// =============================================================================

/// Discards every entry. Used when the audit backend is `none`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLogger;

#[async_trait]
impl AuditLogger for NoOpAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
