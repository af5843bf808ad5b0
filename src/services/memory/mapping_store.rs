use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{MappingOrigin, NameMapping};
use crate::services::matching::normalize;
use crate::services::store::{
    load_typed, save_typed, write_staged, StagedTable, TableStore, NAME_MAPPING_TABLE,
};
use crate::types::errors::StoreError;

/// Confidence given to mappings that predate confidence tracking.
pub const LEGACY_CONFIDENCE: f64 = 100.0;

/// Stored row shape. Older rows carry only the two names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MappingRow {
    booking_name: String,
    checkin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
}

impl MappingRow {
    fn is_legacy(&self) -> bool {
        self.confidence.is_none() || self.origin.is_none()
    }

    fn into_mapping(self) -> (String, NameMapping) {
        let origin = self
            .origin
            .as_deref()
            .and_then(|o| o.parse::<MappingOrigin>().ok())
            .unwrap_or(MappingOrigin::Legacy);
        (
            normalize(&self.booking_name),
            NameMapping {
                target: normalize(&self.checkin_name),
                confidence: self.confidence.unwrap_or(LEGACY_CONFIDENCE),
                timestamp: self.timestamp,
                origin,
            },
        )
    }

    fn from_mapping(booking_name: &str, mapping: &NameMapping) -> Self {
        Self {
            booking_name: booking_name.to_string(),
            checkin_name: mapping.target.clone(),
            confidence: Some(mapping.confidence),
            timestamp: mapping.timestamp,
            origin: Some(mapping.origin.to_string()),
        }
    }
}

/// One mapping as listed in the learned-matches manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub booking_name: String,
    #[serde(flatten)]
    pub mapping: NameMapping,
}

pub struct MappingStore<'a, S> {
    store: &'a S,
}

impl<'a, S: TableStore> MappingStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn rows(&self) -> Result<Vec<MappingRow>, StoreError> {
        load_typed(self.store, NAME_MAPPING_TABLE).await
    }

    /// All mappings keyed by normalized booking name. A later row wins.
    pub async fn load(&self) -> Result<HashMap<String, NameMapping>, StoreError> {
        Ok(self
            .rows()
            .await?
            .into_iter()
            .map(MappingRow::into_mapping)
            .collect())
    }

    pub async fn get(&self, booking_name: &str) -> Result<Option<NameMapping>, StoreError> {
        Ok(self.load().await?.remove(&normalize(booking_name)))
    }

    /// Build the table content that inserts or overwrites the mapping for
    /// `booking_name`, stamped now. Nothing is written.
    pub async fn stage_upsert(
        &self,
        booking_name: &str,
        checkin_name: &str,
        confidence: f64,
        origin: MappingOrigin,
    ) -> Result<(NameMapping, StagedTable), StoreError> {
        let key = normalize(booking_name);
        let mapping = NameMapping {
            target: normalize(checkin_name),
            confidence: confidence.clamp(0.0, 100.0),
            timestamp: Some(Utc::now()),
            origin,
        };

        let mut rows = self.rows().await?;
        rows.retain(|row| normalize(&row.booking_name) != key);
        rows.push(MappingRow::from_mapping(&key, &mapping));
        let staged = StagedTable::from_values(NAME_MAPPING_TABLE, &rows)?;
        Ok((mapping, staged))
    }

    /// Insert or overwrite the mapping for `booking_name`, stamped now.
    pub async fn upsert(
        &self,
        booking_name: &str,
        checkin_name: &str,
        confidence: f64,
        origin: MappingOrigin,
    ) -> Result<NameMapping, StoreError> {
        let (mapping, staged) = self
            .stage_upsert(booking_name, checkin_name, confidence, origin)
            .await?;
        write_staged(self.store, vec![staged]).await?;

        log::info!(
            "Mapping saved: '{}' -> '{}' ({}, {:.1})",
            normalize(booking_name),
            mapping.target,
            origin,
            mapping.confidence
        );
        Ok(mapping)
    }

    /// Table content without the mapping of `booking_name`, or `None` when
    /// there is no such mapping.
    pub async fn stage_delete(&self, booking_name: &str) -> Result<Option<StagedTable>, StoreError> {
        let key = normalize(booking_name);
        let mut rows = self.rows().await?;
        let before = rows.len();
        rows.retain(|row| normalize(&row.booking_name) != key);
        if rows.len() == before {
            return Ok(None);
        }
        Ok(Some(StagedTable::from_values(NAME_MAPPING_TABLE, &rows)?))
    }

    /// Remove the mapping of `booking_name`. Returns whether one existed.
    pub async fn delete(&self, booking_name: &str) -> Result<bool, StoreError> {
        let Some(staged) = self.stage_delete(booking_name).await? else {
            return Ok(false);
        };
        write_staged(self.store, vec![staged]).await?;
        log::info!("Mapping deleted: '{}'", normalize(booking_name));
        Ok(true)
    }

    /// All mappings sorted by booking name.
    pub async fn list(&self) -> Result<Vec<MappingEntry>, StoreError> {
        let mut entries: Vec<MappingEntry> = self
            .load()
            .await?
            .into_iter()
            .map(|(booking_name, mapping)| MappingEntry {
                booking_name,
                mapping,
            })
            .collect();
        entries.sort_by(|a, b| a.booking_name.cmp(&b.booking_name));
        Ok(entries)
    }

    /// Rewrite rows that lack confidence or origin as explicit legacy
    /// records. Returns the number of rewritten rows; writes nothing when
    /// every row is already current.
    pub async fn migrate_legacy(&self) -> Result<usize, StoreError> {
        let rows = self.rows().await?;
        let legacy = rows.iter().filter(|row| row.is_legacy()).count();
        if legacy == 0 {
            return Ok(0);
        }

        let migrated: Vec<MappingRow> = rows
            .into_iter()
            .map(|row| {
                let (key, mapping) = row.into_mapping();
                MappingRow::from_mapping(&key, &mapping)
            })
            .collect();
        save_typed(self.store, NAME_MAPPING_TABLE, &migrated).await?;
        log::info!("Migrated {} legacy mapping row(s)", legacy);
        Ok(legacy)
    }
}

#[cfg(test)]
#[path = "tests/mapping_store_tests.rs"]
mod tests;
