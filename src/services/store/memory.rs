use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Row, TableStore};
use crate::types::errors::StoreError;

/// In-process table store. Used by tests and by embedders that keep
/// everything in memory.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rows of `table`, bypassing the read counter.
    pub fn snapshot(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `read_table` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of table writes applied so far (a batch counts each table).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl TableStore for MemoryTableStore {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot(table))
    }

    async fn write_table(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(table.to_string(), rows.to_vec());
        Ok(())
    }

    async fn write_tables(&self, batch: &[(String, Vec<Row>)]) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (table, rows) in batch {
            self.writes.fetch_add(1, Ordering::SeqCst);
            tables.insert(table.clone(), rows.clone());
        }
        Ok(())
    }
}
