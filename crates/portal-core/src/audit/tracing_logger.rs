// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit logger that forwards entries to `tracing`.
//!
//! Entries are emitted under the `audit` target so the subscriber can route
//! or filter them independently of application logs.

use async_trait::async_trait;

use super::error::{AuditError, AuditResult};
use super::types::{AuditFilter, AuditLog, AuditSeverity};
use super::AuditLogger;

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditLogger {
    include_details: bool,
}

impl TracingAuditLogger {
    /// Creates a logger that omits the free-form details payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes the serialized details payload in each event.
    pub fn with_details(mut self) -> Self {
        self.include_details = true;
        self
    }
}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let details = if self.include_details && !entry.details.is_null() {
            serde_json::to_string(&entry.details)?
        } else {
            String::new()
        };
        let result = serde_json::to_string(&entry.result)?;
        let user = entry.user_id.as_deref().unwrap_or("-");
        let ip = entry.client_ip.map(|ip| ip.to_string()).unwrap_or_default();

        match entry.severity {
            AuditSeverity::Info | AuditSeverity::Notice => tracing::info!(
                target: "audit",
                id = %entry.id,
                action = entry.action.as_str(),
                resource = %entry.resource.full_path(),
                user = user,
                client_ip = %ip,
                result = %result,
                details = %details,
                "audit"
            ),
            AuditSeverity::Warning => tracing::warn!(
                target: "audit",
                id = %entry.id,
                action = entry.action.as_str(),
                resource = %entry.resource.full_path(),
                user = user,
                client_ip = %ip,
                result = %result,
                details = %details,
                "audit"
            ),
            AuditSeverity::Error => tracing::error!(
                target: "audit",
                id = %entry.id,
                action = entry.action.as_str(),
                resource = %entry.resource.full_path(),
                user = user,
                client_ip = %ip,
                result = %result,
                details = %details,
                "audit"
            ),
        }

        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Err(AuditError::QueryNotSupported { sink: "tracing" })
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
