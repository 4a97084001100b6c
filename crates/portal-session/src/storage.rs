// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Durable key/value storage for the client session.
//!
//! [`SessionStorage`] is a string-keyed store with string values, the shape
//! of a browser's local storage. Two backends ship with the crate:
//!
//! - [`MemoryStorage`]: process-local, for tests and embedded use
//! - [`FileStorage`]: one file per key under a directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

// =============================================================================
// SessionStorage
// =============================================================================

/// Key/value storage backend.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Reads a value. A missing key is `Ok(None)`.
    async fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Removes a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> SessionResult<()>;

    /// Returns the backend name for identification.
    fn name(&self) -> &str {
        "session_storage"
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage.
///
/// Clones share the same map, so a clone can stand in for "the same browser
/// storage" when a test restarts a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the raw value under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Writes a raw value without going through a session.
    pub fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.put_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage: each key is a `<key>.json` file under a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> SessionResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SessionError::storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Session value written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

// =============================================================================
// Tests
// =============================================================================
