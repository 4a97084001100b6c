// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User persistence seam.
//!
//! [`UserStore`] is the boundary between the access core and the document
//! store. Email uniqueness is enforced here. The in-memory implementation is
//! used by tests, development mode and the demo server.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::role::Role;
use crate::user::{normalize_email, User};

// =============================================================================
// UserStore
// =============================================================================

/// Async storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by normalized email.
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>>;

    /// Lists all users, newest first.
    async fn list(&self) -> CoreResult<Vec<User>>;

    /// Inserts a new user. Fails with `Conflict` on a duplicate id or email.
    async fn insert(&self, user: User) -> CoreResult<User>;

    /// Replaces an existing user. Fails with `NotFound` or `Conflict`.
    async fn update(&self, user: User) -> CoreResult<User>;

    /// Sets the role of a user and refreshes its update timestamp.
    async fn set_role(&self, id: &str, role: Role) -> CoreResult<User>;

    /// Replaces the stored credential only if it still equals `expected`.
    ///
    /// Returns `false` when the credential had already changed.
    async fn replace_credential(&self, id: &str, expected: &str, new_hash: String)
        -> CoreResult<bool>;

    /// Deletes a user. Fails with `NotFound`.
    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// Returns the store name for identification.
    fn name(&self) -> &str {
        "user_store"
    }
}

// =============================================================================
// InMemoryUserStore
// =============================================================================

/// In-memory user store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `users`.
    ///
    /// Later entries with a duplicate id replace earlier ones.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Returns the raw stored credential of a user.
    pub fn credential_of(&self, id: &str) -> Option<String> {
        self.users.read().get(id).map(|u| u.password_hash.clone())
    }

    fn email_taken(users: &HashMap<String, User>, email: &str, except_id: Option<&str>) -> bool {
        users
            .values()
            .any(|u| u.email == email && Some(u.id.as_str()) != except_id)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn list(&self) -> CoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert(&self, mut user: User) -> CoreResult<User> {
        user.email = normalize_email(&user.email);

        let mut users = self.users.write();
        if users.contains_key(&user.id) {
            return Err(CoreError::conflict(format!("User id already exists: {}", user.id)));
        }
        if Self::email_taken(&users, &user.email, None) {
            return Err(CoreError::conflict("Email already exists"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, mut user: User) -> CoreResult<User> {
        user.email = normalize_email(&user.email);

        let mut users = self.users.write();
        if !users.contains_key(&user.id) {
            return Err(CoreError::not_found(format!("user {}", user.id)));
        }
        if Self::email_taken(&users, &user.email, Some(&user.id)) {
            return Err(CoreError::conflict("Email already exists"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn set_role(&self, id: &str, role: Role) -> CoreResult<User> {
        let mut users = self.users.write();
        let user = users
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("user {}", id)))?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn replace_credential(
        &self,
        id: &str,
        expected: &str,
        new_hash: String,
    ) -> CoreResult<bool> {
        let mut users = self.users.write();
        let user = users
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("user {}", id)))?;
        if user.password_hash != expected {
            return Ok(false);
        }
        user.password_hash = new_hash;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.users
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found(format!("user {}", id)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: &str, email: &str, role: Role) -> User {
        User::new(id, email, "hash", role).with_id(id)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryUserStore::new();
        store.insert(user("u1", "A@Portal.Test", Role::Qa)).await.unwrap();

        let found = store.find_by_email("  a@portal.test").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some("u1".to_string()));
        assert!(store.find_by_id("u1").await.unwrap().is_some());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_uniqueness() {
        let store = InMemoryUserStore::new();
        store.insert(user("u1", "a@portal.test", Role::Qa)).await.unwrap();

        let err = store
            .insert(user("u2", "A@PORTAL.TEST", Role::Hr))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));

        store.insert(user("u2", "b@portal.test", Role::Hr)).await.unwrap();
        let mut second = store.find_by_id("u2").await.unwrap().unwrap();
        second.email = "a@portal.test".into();
        assert!(store.update(second).await.is_err());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let mut older = user("old", "old@portal.test", Role::Qa);
        older.created_at = Utc::now() - Duration::days(1);
        let newer = user("new", "new@portal.test", Role::Qa);

        let store = InMemoryUserStore::with_users([older, newer]);
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_set_role_refreshes_timestamp() {
        let mut u = user("u1", "a@portal.test", Role::Qa);
        u.updated_at = Utc::now() - Duration::hours(1);
        let before = u.updated_at;
        let store = InMemoryUserStore::with_users([u]);

        let updated = store.set_role("u1", Role::Manager).await.unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert!(updated.updated_at > before);

        assert!(matches!(
            store.set_role("nobody", Role::Qa).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_credential_is_compare_and_set() {
        let store = InMemoryUserStore::with_users([user("u1", "a@portal.test", Role::Qa)]);

        assert!(store.replace_credential("u1", "hash", "new".into()).await.unwrap());
        assert!(!store.replace_credential("u1", "hash", "newer".into()).await.unwrap());
        assert_eq!(store.credential_of("u1").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryUserStore::with_users([user("u1", "a@portal.test", Role::Qa)]);
        store.delete("u1").await.unwrap();
        assert!(store.is_empty());
        assert!(store.delete("u1").await.is_err());
    }
}
