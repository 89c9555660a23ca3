//! # redb-backed School Storage
//!
//! A disk-backed row store using the redb embedded database, providing:
//! - ACID transactions (one write transaction per `WriteBatch`)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Each [`Table`] maps to one redb table of `u64 -> postcard bytes`. Id
//! counters live in a `metadata` table and are written inside the same
//! transaction as the rows they were allocated for.

use crate::SchoolError;
use crate::store::{SchoolStore, Table, WriteBatch, WriteOp};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for id counters: table name -> next id
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Row table definition for a store table.
fn rows(table: Table) -> TableDefinition<'static, u64, &'static [u8]> {
    TableDefinition::new(table.name())
}

fn storage_err(e: impl std::fmt::Display) -> SchoolError {
    SchoolError::Storage(e.to_string())
}

/// A disk-backed school store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Next id per table, loaded on open and persisted on every commit.
    next_ids: BTreeMap<Table, u64>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_ids", &self.next_ids)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a school database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchoolError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            for table in Table::ALL {
                let _ = write_txn.open_table(rows(table)).map_err(storage_err)?;
            }
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        // Load id counters
        let next_ids = {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let meta = read_txn.open_table(METADATA).map_err(storage_err)?;
            let mut next_ids = BTreeMap::new();
            for table in Table::ALL {
                let next = meta
                    .get(table.name())
                    .map_err(storage_err)?
                    .map(|v| v.value())
                    .unwrap_or(1);
                next_ids.insert(table, next);
            }
            next_ids
        };

        tracing::debug!(path = %path.as_ref().display(), "opened redb school store");

        Ok(Self { db, next_ids })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), SchoolError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }
}

// =============================================================================
// SCHOOLSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl SchoolStore for RedbStore {
    fn load(&self, table: Table, key: u64) -> Result<Option<Vec<u8>>, SchoolError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let rows_table = read_txn.open_table(rows(table)).map_err(storage_err)?;
        Ok(rows_table
            .get(key)
            .map_err(storage_err)?
            .map(|v| v.value().to_vec()))
    }

    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, SchoolError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let rows_table = read_txn.open_table(rows(table)).map_err(storage_err)?;

        let mut out = Vec::new();
        for entry in rows_table.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            out.push((key.value(), value.value().to_vec()));
        }
        Ok(out)
    }

    fn count(&self, table: Table) -> Result<usize, SchoolError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let rows_table = read_txn.open_table(rows(table)).map_err(storage_err)?;
        Ok(rows_table.len().map_err(storage_err)? as usize)
    }

    fn allocate(&mut self, table: Table) -> u64 {
        let next = self.next_ids.entry(table).or_insert(1);
        let id = *next;
        *next = next.saturating_add(1);
        id
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), SchoolError> {
        // Group writes per table; a redb table can only be open once per
        // transaction. Order within a table is preserved.
        let mut per_table: BTreeMap<Table, Vec<WriteOp>> = BTreeMap::new();
        for op in batch.into_ops() {
            let table = match &op {
                WriteOp::Put { table, .. } | WriteOp::Delete { table, .. } => *table,
            };
            per_table.entry(table).or_default().push(op);
        }

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            for (table, ops) in per_table {
                let mut rows_table = write_txn.open_table(rows(table)).map_err(storage_err)?;
                for op in ops {
                    match op {
                        WriteOp::Put { key, bytes, .. } => {
                            rows_table
                                .insert(key, bytes.as_slice())
                                .map_err(storage_err)?;
                        }
                        WriteOp::Delete { key, .. } => {
                            rows_table.remove(key).map_err(storage_err)?;
                        }
                    }
                }
            }

            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
            for (table, next) in &self.next_ids {
                meta.insert(table.name(), *next).map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
