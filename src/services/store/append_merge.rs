//! Idempotent append: incoming rows whose key already exists are dropped.
//!
//! Re-ingesting the same source data therefore never duplicates rows. The
//! read-modify-write is not locked; two concurrent merges into the same table
//! can lose one side's additions.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;

use super::{to_rows, write_staged, Row, StagedTable, TableStore};
use crate::types::errors::StoreError;

/// Staged result of merging one table, ready to be written.
#[derive(Debug, Clone)]
pub struct MergePlan {
    pub table: String,
    pub rows: Vec<Row>,
    pub inserted: usize,
    /// Existing rows kept verbatim because they no longer deserialize.
    pub unkeyed: usize,
}

impl MergePlan {
    pub fn has_changes(&self) -> bool {
        self.inserted > 0
    }

    pub fn into_staged(self) -> StagedTable {
        StagedTable {
            table: self.table,
            rows: self.rows,
        }
    }
}

/// Merge `incoming` into `existing` rows without touching any store.
///
/// Existing rows that fail to deserialize are kept verbatim and contribute
/// no key, so an incoming row with the same logical key is appended next to
/// them. Duplicate keys within `incoming` keep the first occurrence.
pub fn plan_append_merge<T, F>(
    table: &str,
    existing: Vec<Row>,
    incoming: &[T],
    key_fn: F,
) -> Result<MergePlan, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> String,
{
    let mut keys: HashSet<String> = HashSet::with_capacity(existing.len());
    let mut unkeyed = 0;
    for row in &existing {
        match serde_json::from_value::<T>(serde_json::Value::Object(row.clone())) {
            Ok(value) => {
                keys.insert(key_fn(&value));
            }
            Err(_) => unkeyed += 1,
        }
    }
    if unkeyed > 0 {
        log::warn!(
            "Append-merge into '{}': {} existing row(s) unreadable, kept without a key",
            table,
            unkeyed
        );
    }

    let fresh: Vec<&T> = incoming
        .iter()
        .filter(|value| keys.insert(key_fn(value)))
        .collect();

    let inserted = fresh.len();
    let mut rows = existing;
    rows.extend(to_rows(&fresh)?);

    Ok(MergePlan {
        table: table.to_string(),
        rows,
        inserted,
        unkeyed,
    })
}

/// Load `table`, append the rows of `incoming` whose key is new, write the
/// combined table back. Returns the number of inserted rows; nothing is
/// written when that number is zero.
pub async fn append_merge<S, T, F>(
    store: &S,
    table: &str,
    incoming: &[T],
    key_fn: F,
) -> Result<usize, StoreError>
where
    S: TableStore,
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> String,
{
    let existing = store.read_table(table).await?;
    let plan = plan_append_merge(table, existing, incoming, key_fn)?;
    if plan.has_changes() {
        store.write_table(table, &plan.rows).await?;
    }
    log::debug!("Append-merge into '{}': {} new row(s)", table, plan.inserted);
    Ok(plan.inserted)
}

/// Write several staged plans in one atomic batch. Plans without changes
/// are left out.
pub async fn commit_plans<S: TableStore>(store: &S, plans: Vec<MergePlan>) -> Result<(), StoreError> {
    let staged: Vec<StagedTable> = plans
        .into_iter()
        .filter(MergePlan::has_changes)
        .map(MergePlan::into_staged)
        .collect();
    write_staged(store, staged).await
}

#[cfg(test)]
#[path = "tests/append_merge_tests.rs"]
mod tests;
