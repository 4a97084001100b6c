// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit entries kept in process memory.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::AuditResult;
use super::types::{AuditAction, AuditFilter, AuditLog};
use super::AuditLogger;

/// Audit sink backed by a shared ring of entries.
///
/// Clones see the same entries, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLogger {
    entries: Arc<RwLock<VecDeque<AuditLog>>>,
    // 0 keeps everything.
    capacity: usize,
}

impl InMemoryAuditLogger {
    /// Creates an unbounded logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logger that drops its oldest entry once `capacity` are held.
    /// A capacity of 0 is unbounded.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: Arc::default(),
            capacity,
        }
    }

    /// Snapshot of every entry, oldest first.
    pub fn entries(&self) -> Vec<AuditLog> {
        self.entries.read().iter().cloned().collect()
    }

    /// Entries recorded for `action`.
    pub fn entries_for_action(&self, action: AuditAction) -> Vec<AuditLog> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.action == action)
            .cloned()
            .collect()
    }

    /// Returns `true` if any entry matches.
    pub fn has_entry(&self, predicate: impl Fn(&AuditLog) -> bool) -> bool {
        self.entries.read().iter().any(predicate)
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLogger {
    async fn log(&self, entry: AuditLog) -> AuditResult<()> {
        let mut entries = self.entries.write();
        if self.capacity > 0 && entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        let mut found: Vec<AuditLog> = self
            .entries
            .read()
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        found.sort_by_key(|entry| entry.timestamp);
        if filter.descending {
            found.reverse();
        }
        if let Some(limit) = filter.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn supports_query(&self) -> bool {
        true
    }
}
