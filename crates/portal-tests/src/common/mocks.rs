// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Storage backends and an audit sink with injectable failures.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use portal_core::audit::{AuditError, AuditFilter, AuditLog, AuditLogger, AuditResult};
use portal_core::{CoreError, CoreResult, InMemoryUserStore, Role, User, UserStore};
use portal_session::{MemoryStorage, SessionError, SessionResult, SessionStorage};

// =============================================================================
// Mock Session Storage
// =============================================================================

/// Session storage over [`MemoryStorage`] whose operations can be made to
/// fail.
#[derive(Debug, Default)]
pub struct MockSessionStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
    write_count: AtomicU64,
}

impl MockSessionStorage {
    /// Creates a storage where every operation succeeds.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a storage sharing `inner`.
    pub fn over(inner: MemoryStorage) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ..Self::default()
        })
    }

    /// Makes reads fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes writes fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes removals fail.
    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// The underlying storage.
    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

#[async_trait]
impl SessionStorage for MockSessionStorage {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SessionError::storage("injected read failure"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::storage("injected write failure"));
        }
        self.inner.set(key, value).await?;
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(SessionError::storage("injected remove failure"));
        }
        self.inner.remove(key).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Mock User Store
// =============================================================================

/// User store over [`InMemoryUserStore`] whose lookups and writes can fail.
#[derive(Debug, Default)]
pub struct MockUserStore {
    inner: InMemoryUserStore,
    fail_credential_writes: AtomicBool,
    fail_user_writes: AtomicBool,
    fail_lookups: AtomicBool,
}

impl MockUserStore {
    /// Creates a store holding `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryUserStore::with_users(users),
            ..Self::default()
        })
    }

    /// Makes credential replacement fail.
    pub fn fail_credential_writes(&self, fail: bool) {
        self.fail_credential_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `update` and `set_role` fail.
    pub fn fail_user_writes(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    fn check_user_write(&self) -> CoreResult<()> {
        if self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(CoreError::storage("injected user write failure"));
        }
        Ok(())
    }

    /// Makes lookups fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// The underlying store.
    pub fn inner(&self) -> &InMemoryUserStore {
        &self.inner
    }

    fn check_lookup(&self) -> CoreResult<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(CoreError::storage("injected lookup failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.check_lookup()?;
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        self.check_lookup()?;
        self.inner.find_by_id(id).await
    }

    async fn list(&self) -> CoreResult<Vec<User>> {
        self.check_lookup()?;
        self.inner.list().await
    }

    async fn insert(&self, user: User) -> CoreResult<User> {
        self.inner.insert(user).await
    }

    async fn update(&self, user: User) -> CoreResult<User> {
        self.check_user_write()?;
        self.inner.update(user).await
    }

    async fn set_role(&self, id: &str, role: Role) -> CoreResult<User> {
        self.check_user_write()?;
        self.inner.set_role(id, role).await
    }

    async fn replace_credential(
        &self,
        id: &str,
        expected: &str,
        new_hash: String,
    ) -> CoreResult<bool> {
        if self.fail_credential_writes.load(Ordering::SeqCst) {
            return Err(CoreError::storage("injected credential write failure"));
        }
        self.inner.replace_credential(id, expected, new_hash).await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.inner.delete(id).await
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Failing Audit Sink
// =============================================================================

/// Audit sink that rejects every write and counts the attempts.
#[derive(Debug, Default)]
pub struct FailingAuditLogger {
    attempts: AtomicU64,
}

impl FailingAuditLogger {
    /// Creates a sink with no recorded attempts.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of rejected writes so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditLogger for FailingAuditLogger {
    async fn log(&self, _entry: AuditLog) -> AuditResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::write_failed("injected audit failure"))
    }

    async fn query(&self, _filter: AuditFilter) -> AuditResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }

    async fn flush(&self) -> AuditResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }
}
