//! Human review of one day's errors: suggestions, confirmation, rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Reconciler;
use crate::database::models::{BookingResult, MappingOrigin, NameMapping, RejectedPair};
use crate::services::corrections::{open_errors_in_window, CorrectionTracker, OpenErrorDay};
use crate::services::customers::{AnnotatedError, CustomerDirectory};
use crate::services::matching::normalize;
use crate::services::matching::ranker::{assigned_elsewhere, rank_with, Suggestion};
use crate::services::memory::{MappingEntry, MappingStore, RejectionStore};
use crate::services::store::{write_staged, TableStore};
use crate::types::errors::{ReconcileError, ReconcileResult};

/// How a mapping was chosen during review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MatchDecision {
    /// Accepted a ranked suggestion with this score.
    Suggested { score: f64 },
    /// Picked directly from the check-in list.
    Manual,
}

impl MatchDecision {
    fn origin(&self) -> MappingOrigin {
        match self {
            MatchDecision::Suggested { .. } => MappingOrigin::User,
            MatchDecision::Manual => MappingOrigin::Manual,
        }
    }

    fn confidence(&self) -> f64 {
        match self {
            MatchDecision::Suggested { score } => *score,
            MatchDecision::Manual => 100.0,
        }
    }
}

/// One error of a day together with its correction status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    pub key: String,
    pub booking: BookingResult,
    pub open: bool,
}

impl<S: TableStore> Reconciler<S> {
    /// Persisted errors of `date` with their open/resolved status.
    pub async fn error_batch(&self, date: NaiveDate) -> ReconcileResult<Vec<ErrorItem>> {
        let snapshot = self.snapshot(date).await?;
        let corrections = CorrectionTracker::new(self.store()).load().await?;

        Ok(snapshot
            .bookings
            .into_iter()
            .filter(|b| b.is_error)
            .map(|booking| {
                let key = booking.natural_key();
                let open = !corrections.get(&key).is_some_and(|entry| entry.resolved);
                ErrorItem { key, booking, open }
            })
            .collect())
    }

    /// Open errors of `date`, each annotated from the customer directory.
    pub async fn annotated_errors(&self, date: NaiveDate) -> ReconcileResult<Vec<AnnotatedError>> {
        let directory = CustomerDirectory::load(self.store()).await?;
        Ok(self
            .error_batch(date)
            .await?
            .iter()
            .filter(|item| item.open)
            .map(|item| directory.annotate(&item.booking))
            .collect())
    }

    /// Ranked check-in candidates for one unmatched booking of `date`.
    ///
    /// Check-ins claimed by the mapping of another error in the same day's
    /// batch are never offered.
    pub async fn suggestions(
        &self,
        date: NaiveDate,
        booking_name: &str,
    ) -> ReconcileResult<Vec<Suggestion>> {
        let query = normalize(booking_name);
        let snapshot = self.snapshot(date).await?;
        let mappings = MappingStore::new(self.store()).load().await?;
        let rejected = RejectionStore::new(self.store()).load().await?;

        let batch = snapshot
            .bookings
            .iter()
            .filter(|b| b.is_error)
            .map(|b| b.name_norm.as_str());
        let already_assigned = assigned_elsewhere(&query, batch, &mappings);
        let candidates: Vec<String> = snapshot
            .checkins
            .iter()
            .map(|c| c.name_norm.clone())
            .collect();

        let suggestions = rank_with(
            &query,
            &candidates,
            &mappings,
            &rejected,
            &already_assigned,
            &self.settings().ranking,
        );
        log::debug!(
            "{} suggestion(s) for '{}' on {}",
            suggestions.len(),
            query,
            date
        );
        Ok(suggestions)
    }

    /// Check-in names of `date` available for a manual pick.
    pub async fn manual_candidates(
        &self,
        date: NaiveDate,
        booking_name: &str,
    ) -> ReconcileResult<Vec<String>> {
        let query = normalize(booking_name);
        let snapshot = self.snapshot(date).await?;
        let mappings = MappingStore::new(self.store()).load().await?;
        let batch = snapshot
            .bookings
            .iter()
            .filter(|b| b.is_error)
            .map(|b| b.name_norm.as_str());
        let already_assigned = assigned_elsewhere(&query, batch, &mappings);

        Ok(snapshot
            .checkins
            .into_iter()
            .map(|c| c.name_norm)
            .filter(|name| !already_assigned.contains(name))
            .collect())
    }

    /// Record `booking` → `checkin_name`, drop any rejection of that pair
    /// and mark the booking's error resolved, all in one batch.
    pub async fn confirm_mapping(
        &self,
        booking: &BookingResult,
        checkin_name: &str,
        decision: MatchDecision,
    ) -> ReconcileResult<NameMapping> {
        if normalize(checkin_name).is_empty() {
            return Err(ReconcileError::InvalidInput(
                "check-in name must not be empty".into(),
            ));
        }

        let (mapping, mapping_rows) = MappingStore::new(self.store())
            .stage_upsert(
                &booking.name_norm,
                checkin_name,
                decision.confidence(),
                decision.origin(),
            )
            .await?;
        let key = booking.natural_key();
        let (_, correction_rows) = CorrectionTracker::new(self.store())
            .stage_resolve(&key, booking.analysis_date)
            .await?;

        let mut staged = vec![mapping_rows, correction_rows];
        staged.extend(
            RejectionStore::new(self.store())
                .stage_remove(&booking.name_norm, checkin_name)
                .await?,
        );
        write_staged(self.store(), staged).await?;

        log::info!(
            "Mapping confirmed: '{}' -> '{}' ({}, {:.1}), error {} resolved",
            booking.name_norm,
            mapping.target,
            mapping.origin,
            mapping.confidence,
            key
        );
        Ok(mapping)
    }

    /// Declare `booking_name` and `checkin_name` different people.
    ///
    /// A mapping between exactly these two names is removed in the same
    /// batch. Returns `false` when the pair was already rejected.
    pub async fn reject_mapping(
        &self,
        booking_name: &str,
        checkin_name: &str,
    ) -> ReconcileResult<bool> {
        let mappings = MappingStore::new(self.store());
        let target = normalize(checkin_name);
        let mut staged = Vec::new();
        if mappings
            .get(booking_name)
            .await?
            .is_some_and(|m| m.target == target)
        {
            staged.extend(mappings.stage_delete(booking_name).await?);
        }

        let added = RejectionStore::new(self.store())
            .stage_add(booking_name, checkin_name)
            .await?;
        let is_new = added.is_some();
        staged.extend(added);
        write_staged(self.store(), staged).await?;

        if is_new {
            log::info!(
                "Rejected pair recorded: '{}' x '{}'",
                normalize(booking_name),
                target
            );
        }
        Ok(is_new)
    }

    pub async fn undo_rejection(
        &self,
        booking_name: &str,
        checkin_name: &str,
    ) -> ReconcileResult<bool> {
        Ok(RejectionStore::new(self.store())
            .remove(booking_name, checkin_name)
            .await?)
    }

    // ─── Learned matches ─────────────────────────────────────────────────────

    pub async fn list_mappings(&self) -> ReconcileResult<Vec<MappingEntry>> {
        Ok(MappingStore::new(self.store()).list().await?)
    }

    pub async fn list_rejections(&self) -> ReconcileResult<Vec<RejectedPair>> {
        Ok(RejectionStore::new(self.store()).list().await?)
    }

    pub async fn delete_mapping(&self, booking_name: &str) -> ReconcileResult<()> {
        if MappingStore::new(self.store()).delete(booking_name).await? {
            Ok(())
        } else {
            Err(ReconcileError::NotFound(format!(
                "mapping for {}",
                normalize(booking_name)
            )))
        }
    }

    pub async fn migrate_legacy_mappings(&self) -> ReconcileResult<usize> {
        Ok(MappingStore::new(self.store()).migrate_legacy().await?)
    }

    // ─── Corrections ─────────────────────────────────────────────────────────

    pub async fn is_open(&self, key: &str) -> ReconcileResult<bool> {
        Ok(CorrectionTracker::new(self.store()).is_open(key).await?)
    }

    pub async fn resolve(&self, key: &str, date: NaiveDate) -> ReconcileResult<()> {
        CorrectionTracker::new(self.store()).resolve(key, date).await?;
        Ok(())
    }

    pub async fn reopen(&self, key: &str) -> ReconcileResult<bool> {
        Ok(CorrectionTracker::new(self.store()).reopen(key).await?)
    }

    /// Unresolved errors of the `days` dates before `reference`.
    pub async fn open_errors(
        &self,
        reference: NaiveDate,
        days: u32,
    ) -> ReconcileResult<Vec<OpenErrorDay>> {
        Ok(open_errors_in_window(self.store(), reference, days).await?)
    }
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
