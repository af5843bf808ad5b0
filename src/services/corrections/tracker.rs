//! Open/resolved status per error, keyed by the booking's natural key.
//!
//! Absence of an entry means "open". Reopening deletes the entry instead of
//! storing `resolved = false`.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;

use crate::database::models::CorrectionEntry;
use crate::services::store::{
    load_typed, save_typed, write_staged, StagedTable, TableStore, CORRECTIONS_TABLE,
};
use crate::types::errors::StoreError;

pub struct CorrectionTracker<'a, S> {
    store: &'a S,
}

impl<'a, S: TableStore> CorrectionTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn entries(&self) -> Result<Vec<CorrectionEntry>, StoreError> {
        load_typed(self.store, CORRECTIONS_TABLE).await
    }

    /// Entries keyed by natural key. A later entry for the same key wins.
    pub async fn load(&self) -> Result<HashMap<String, CorrectionEntry>, StoreError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect())
    }

    pub async fn is_resolved(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .load()
            .await?
            .get(key)
            .is_some_and(|entry| entry.resolved))
    }

    pub async fn is_open(&self, key: &str) -> Result<bool, StoreError> {
        Ok(!self.is_resolved(key).await?)
    }

    /// Table content with `key` marked resolved. Nothing is written.
    pub async fn stage_resolve(
        &self,
        key: &str,
        date: NaiveDate,
    ) -> Result<(CorrectionEntry, StagedTable), StoreError> {
        let mut entries = self.entries().await?;
        entries.retain(|entry| entry.key != key);

        let entry = CorrectionEntry {
            key: key.to_string(),
            date,
            resolved: true,
            timestamp: Utc::now(),
        };
        entries.push(entry.clone());
        let staged = StagedTable::from_values(CORRECTIONS_TABLE, &entries)?;
        Ok((entry, staged))
    }

    /// Mark `key` resolved. Resolving again only refreshes the timestamp.
    pub async fn resolve(&self, key: &str, date: NaiveDate) -> Result<CorrectionEntry, StoreError> {
        let (entry, staged) = self.stage_resolve(key, date).await?;
        write_staged(self.store, vec![staged]).await?;

        log::info!("Error resolved: {}", key);
        Ok(entry)
    }

    /// Delete the entry of `key`. Returns whether one existed.
    pub async fn reopen(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries().await?;
        let before = entries.len();
        entries.retain(|entry| entry.key != key);
        if entries.len() == before {
            return Ok(false);
        }

        save_typed(self.store, CORRECTIONS_TABLE, &entries).await?;
        log::info!("Error reopened: {}", key);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
