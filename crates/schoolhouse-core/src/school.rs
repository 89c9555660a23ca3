//! # School Module
//!
//! The facade every domain module works through.
//!
//! ## Storage Backends
//!
//! A `School` supports two storage backends:
//! - `InMemory`: Uses `MemoryStore` (fast, volatile)
//! - `Persistent`: Uses `RedbStore` for disk-backed ACID storage
//!
//! Domain engines (`Catalog`, `Groups`, `Enrollment`, ...) never touch a
//! backend directly. They read typed records through `get`/`list` and write
//! through one `WriteBatch` per operation.

use crate::model::{ContactMessage, Course, Filia, Group, Notification, Record, User};
use crate::SchoolError;
use crate::storage::RedbStore;
use crate::store::{MemoryStore, SchoolStore, WriteBatch, decode};
use serde::Serialize;
use std::path::Path;

/// Storage backend for a School.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory tables (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed tables using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// Row counts for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchoolCounts {
    pub users: usize,
    pub filias: usize,
    pub courses: usize,
    pub groups: usize,
    pub contact_messages: usize,
    pub notifications: usize,
}

/// A School owns the storage backend and hands out typed access to it.
///
/// Note: School does NOT implement Clone; a redb handle cannot be shared
/// that way. Share it behind a lock instead.
#[derive(Debug, Default)]
pub struct School {
    backend: StorageBackend,
}

impl School {
    /// Create a new empty school with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a school with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, SchoolError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Compact the database file.
    ///
    /// Returns `false` for in-memory storage, which has nothing to compact.
    pub fn compact(&mut self) -> Result<bool, SchoolError> {
        match &mut self.backend {
            StorageBackend::InMemory(_) => Ok(false),
            StorageBackend::Persistent(r) => {
                r.compact()?;
                Ok(true)
            }
        }
    }

    fn store(&self) -> &dyn SchoolStore {
        match &self.backend {
            StorageBackend::InMemory(m) => m,
            StorageBackend::Persistent(r) => r,
        }
    }

    fn store_mut(&mut self) -> &mut dyn SchoolStore {
        match &mut self.backend {
            StorageBackend::InMemory(m) => m,
            StorageBackend::Persistent(r) => r,
        }
    }

    // =========================================================================
    // TYPED ACCESS
    // =========================================================================

    /// Load a record by key.
    pub fn get<R: Record>(&self, key: u64) -> Result<Option<R>, SchoolError> {
        self.store()
            .load(R::TABLE, key)?
            .map(|bytes| decode::<R>(&bytes))
            .transpose()
    }

    /// Load a record by key, failing with `NotFound` when it is absent.
    pub fn require<R: Record>(&self, key: u64) -> Result<R, SchoolError> {
        self.get::<R>(key)?.ok_or(SchoolError::NotFound {
            kind: R::KIND,
            id: key,
        })
    }

    /// Load every record of a kind, in key order.
    pub fn list<R: Record>(&self) -> Result<Vec<R>, SchoolError> {
        self.store()
            .scan(R::TABLE)?
            .into_iter()
            .map(|(_, bytes)| decode::<R>(&bytes))
            .collect()
    }

    /// Reserve the next key for a record kind.
    pub fn next_id<R: Record>(&mut self) -> u64 {
        self.store_mut().allocate(R::TABLE)
    }

    /// Apply a batch of writes atomically.
    pub fn commit(&mut self, batch: WriteBatch) -> Result<(), SchoolError> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.len();
        self.store_mut().commit(batch).inspect_err(|e| {
            tracing::error!(error = %e, ops, "write batch failed");
        })
    }

    /// Count rows per table.
    pub fn counts(&self) -> Result<SchoolCounts, SchoolError> {
        let store = self.store();
        Ok(SchoolCounts {
            users: store.count(User::TABLE)?,
            filias: store.count(Filia::TABLE)?,
            courses: store.count(Course::TABLE)?,
            groups: store.count(Group::TABLE)?,
            contact_messages: store.count(ContactMessage::TABLE)?,
            notifications: store.count(Notification::TABLE)?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
