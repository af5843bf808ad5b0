use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::database::models::RejectedPair;
use crate::services::matching::normalize;
use crate::services::store::{
    load_typed, write_staged, StagedTable, TableStore, REJECTED_MATCHES_TABLE,
};
use crate::types::errors::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RejectionRow {
    booking_name: String,
    checkin_name: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl RejectionRow {
    fn pair(&self) -> RejectedPair {
        RejectedPair::new(&normalize(&self.booking_name), &normalize(&self.checkin_name))
    }
}

pub struct RejectionStore<'a, S> {
    store: &'a S,
}

impl<'a, S: TableStore> RejectionStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn rows(&self) -> Result<Vec<RejectionRow>, StoreError> {
        load_typed(self.store, REJECTED_MATCHES_TABLE).await
    }

    pub async fn load(&self) -> Result<HashSet<RejectedPair>, StoreError> {
        Ok(self.rows().await?.iter().map(RejectionRow::pair).collect())
    }

    /// Table content with the pair added, or `None` when it is already
    /// rejected.
    pub async fn stage_add(
        &self,
        booking_name: &str,
        checkin_name: &str,
    ) -> Result<Option<StagedTable>, StoreError> {
        let pair = RejectedPair::new(&normalize(booking_name), &normalize(checkin_name));
        let mut rows = self.rows().await?;
        if rows.iter().any(|row| row.pair() == pair) {
            return Ok(None);
        }

        rows.push(RejectionRow {
            booking_name: pair.booking_name,
            checkin_name: pair.checkin_name,
            timestamp: Some(Utc::now()),
        });
        Ok(Some(StagedTable::from_values(REJECTED_MATCHES_TABLE, &rows)?))
    }

    /// Record a rejection. Adding an existing pair changes nothing and
    /// returns `false`.
    pub async fn add(&self, booking_name: &str, checkin_name: &str) -> Result<bool, StoreError> {
        let Some(staged) = self.stage_add(booking_name, checkin_name).await? else {
            return Ok(false);
        };
        write_staged(self.store, vec![staged]).await?;
        log::info!(
            "Rejected pair recorded: '{}' x '{}'",
            normalize(booking_name),
            normalize(checkin_name)
        );
        Ok(true)
    }

    /// Table content without the pair, or `None` when it was not rejected.
    pub async fn stage_remove(
        &self,
        booking_name: &str,
        checkin_name: &str,
    ) -> Result<Option<StagedTable>, StoreError> {
        let pair = RejectedPair::new(&normalize(booking_name), &normalize(checkin_name));
        let mut rows = self.rows().await?;
        let before = rows.len();
        rows.retain(|row| row.pair() != pair);
        if rows.len() == before {
            return Ok(None);
        }
        Ok(Some(StagedTable::from_values(REJECTED_MATCHES_TABLE, &rows)?))
    }

    /// Remove a rejection. Returns whether the pair was present.
    pub async fn remove(&self, booking_name: &str, checkin_name: &str) -> Result<bool, StoreError> {
        let Some(staged) = self.stage_remove(booking_name, checkin_name).await? else {
            return Ok(false);
        };
        write_staged(self.store, vec![staged]).await?;
        log::info!(
            "Rejected pair restored: '{}' x '{}'",
            normalize(booking_name),
            normalize(checkin_name)
        );
        Ok(true)
    }

    /// All rejected pairs, sorted.
    pub async fn list(&self) -> Result<Vec<RejectedPair>, StoreError> {
        let mut pairs: Vec<RejectedPair> = self.load().await?.into_iter().collect();
        pairs.sort();
        Ok(pairs)
    }
}

#[cfg(test)]
#[path = "tests/rejection_store_tests.rs"]
mod tests;
