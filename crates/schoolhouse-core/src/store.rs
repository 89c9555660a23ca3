//! # Store Module
//!
//! The storage seam of the Schoolhouse core.
//!
//! `SchoolStore` is a row store: encoded records keyed by `u64` inside a
//! fixed set of tables. Writes only happen through [`WriteBatch`], which a
//! back end applies all-or-nothing. Two back ends exist:
//! - [`MemoryStore`]: BTreeMap tables (fast, volatile)
//! - [`crate::storage::RedbStore`]: redb tables (ACID, persistent)
//!
//! Both keep rows in the same postcard encoding, so a record decodes the
//! same way regardless of where it was stored.

use crate::SchoolError;
use crate::model::Record;
use std::collections::BTreeMap;

// =============================================================================
// TABLES
// =============================================================================

/// The tables a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Users,
    Filias,
    Experiences,
    Goals,
    Courses,
    Groups,
    Enrollments,
    ContactMessages,
    Notifications,
}

impl Table {
    pub const ALL: [Self; 9] = [
        Self::Users,
        Self::Filias,
        Self::Experiences,
        Self::Goals,
        Self::Courses,
        Self::Groups,
        Self::Enrollments,
        Self::ContactMessages,
        Self::Notifications,
    ];

    /// Stable on-disk name of the table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Filias => "filias",
            Self::Experiences => "experiences",
            Self::Goals => "goals",
            Self::Courses => "courses",
            Self::Groups => "groups",
            Self::Enrollments => "enrollments",
            Self::ContactMessages => "contact_messages",
            Self::Notifications => "notifications",
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a record into its stored bytes.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, SchoolError> {
    postcard::to_allocvec(record).map_err(|e| SchoolError::Serialization(e.to_string()))
}

/// Decode stored bytes back into a record.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, SchoolError> {
    postcard::from_bytes(bytes).map_err(|e| SchoolError::Serialization(e.to_string()))
}

// =============================================================================
// WRITE BATCH
// =============================================================================

/// A single row write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        table: Table,
        key: u64,
        bytes: Vec<u8>,
    },
    Delete {
        table: Table,
        key: u64,
    },
}

/// An ordered set of row writes that is applied atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert-or-replace of a record.
    pub fn put<R: Record>(&mut self, record: &R) -> Result<(), SchoolError> {
        self.ops.push(WriteOp::Put {
            table: R::TABLE,
            key: record.key(),
            bytes: encode(record)?,
        });
        Ok(())
    }

    /// Queue a delete of a record by key.
    pub fn delete<R: Record>(&mut self, key: u64) {
        self.ops.push(WriteOp::Delete {
            table: R::TABLE,
            key,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Row storage used by [`crate::School`].
///
/// Id counters start at 1 and only grow. Ids handed out for a batch that
/// later fails are not reused.
pub trait SchoolStore {
    /// Load one encoded row.
    fn load(&self, table: Table, key: u64) -> Result<Option<Vec<u8>>, SchoolError>;

    /// Load every encoded row of a table in key order.
    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, SchoolError>;

    /// Number of rows in a table.
    fn count(&self, table: Table) -> Result<usize, SchoolError>;

    /// Reserve the next id of a table.
    fn allocate(&mut self, table: Table) -> u64;

    /// Apply a batch atomically, persisting the id counters with it.
    fn commit(&mut self, batch: WriteBatch) -> Result<(), SchoolError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store backed by ordered maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<Table, BTreeMap<u64, Vec<u8>>>,
    next_ids: BTreeMap<Table, u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchoolStore for MemoryStore {
    fn load(&self, table: Table, key: u64) -> Result<Option<Vec<u8>>, SchoolError> {
        Ok(self
            .tables
            .get(&table)
            .and_then(|rows| rows.get(&key))
            .cloned())
    }

    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, SchoolError> {
        Ok(self
            .tables
            .get(&table)
            .map(|rows| rows.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default())
    }

    fn count(&self, table: Table) -> Result<usize, SchoolError> {
        Ok(self.tables.get(&table).map_or(0, BTreeMap::len))
    }

    fn allocate(&mut self, table: Table) -> u64 {
        let next = self.next_ids.entry(table).or_insert(1);
        let id = *next;
        *next = next.saturating_add(1);
        id
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), SchoolError> {
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, bytes } => {
                    self.tables.entry(table).or_default().insert(key, bytes);
                }
                WriteOp::Delete { table, key } => {
                    if let Some(rows) = self.tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
