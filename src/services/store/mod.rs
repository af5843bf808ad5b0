//! Named-table persistence with list-of-rows semantics.
//!
//! A table is read and written as a whole. Typed stores on top of this
//! (`memory`, `corrections`, result tables) deserialize rows with serde.

pub mod append_merge;
pub mod memory;
pub mod resilient;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;

use crate::types::errors::StoreError;

pub use append_merge::{append_merge, commit_plans, plan_append_merge, MergePlan};
pub use memory::MemoryTableStore;
pub use resilient::{ResilientStore, RetryPolicy};

/// One stored row: a JSON object.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub const BOOKINGS_TABLE: &str = "bookings";
pub const CHECKINS_TABLE: &str = "checkins";
pub const NAME_MAPPING_TABLE: &str = "name_mapping";
pub const REJECTED_MATCHES_TABLE: &str = "rejected_matches";
pub const CORRECTIONS_TABLE: &str = "corrections";
pub const CUSTOMERS_TABLE: &str = "customers";
pub const BOOKING_RAW_TABLE: &str = "booking_raw";

/// Contract of the external key/value store.
///
/// Writes replace the full content of a table. `write_tables` must apply
/// all of its tables or none of them.
pub trait TableStore: Send + Sync {
    fn read_table(&self, table: &str) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;

    fn write_table(
        &self,
        table: &str,
        rows: &[Row],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn write_tables(
        &self,
        batch: &[(String, Vec<Row>)],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Full replacement content of one table, staged for a batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedTable {
    pub table: String,
    pub rows: Vec<Row>,
}

impl StagedTable {
    pub fn from_values<T: Serialize>(table: &str, values: &[T]) -> Result<Self, StoreError> {
        Ok(Self {
            table: table.to_string(),
            rows: to_rows(values)?,
        })
    }
}

/// Write staged tables in one atomic batch. An empty batch writes nothing;
/// a single table goes through `write_table`.
pub async fn write_staged<S: TableStore>(
    store: &S,
    staged: Vec<StagedTable>,
) -> Result<(), StoreError> {
    if staged.is_empty() {
        return Ok(());
    }
    if let [single] = staged.as_slice() {
        return store.write_table(&single.table, &single.rows).await;
    }
    let batch: Vec<(String, Vec<Row>)> = staged
        .into_iter()
        .map(|change| (change.table, change.rows))
        .collect();
    store.write_tables(&batch).await
}

/// Serialize a value into a row. Non-object values are rejected.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(
            format!("row must be a JSON object, got {other}"),
        ))),
    }
}

pub fn to_rows<T: Serialize>(values: &[T]) -> Result<Vec<Row>, StoreError> {
    values.iter().map(to_row).collect()
}

/// Deserialize rows, skipping (and logging) rows that no longer fit `T`.
pub fn from_rows<T: DeserializeOwned>(table: &str, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            match serde_json::from_value::<T>(serde_json::Value::Object(row)) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Skipping malformed row in '{table}': {e}");
                    None
                }
            }
        })
        .collect()
}

/// Read a table and deserialize it into `T`.
pub async fn load_typed<S, T>(store: &S, table: &str) -> Result<Vec<T>, StoreError>
where
    S: TableStore,
    T: DeserializeOwned,
{
    let rows = store.read_table(table).await?;
    Ok(from_rows(table, rows))
}

/// Serialize `values` and replace the table with them.
pub async fn save_typed<S, T>(store: &S, table: &str, values: &[T]) -> Result<(), StoreError>
where
    S: TableStore,
    T: Serialize,
{
    let rows = to_rows(values)?;
    store.write_table(table, &rows).await
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
