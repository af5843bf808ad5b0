//! Reconciliation facade: ingestion, per-day classification, persisted
//! results and the human review workflow over one [`TableStore`].

pub mod ingest;
pub mod pipeline;
pub mod review;
pub mod revenue;

pub use ingest::{IngestReport, RawBookingRow, RawCheckInRow};
pub use pipeline::{is_relevant, reconcile_all, reconcile_day, DayReconciliation};
pub use review::{ErrorItem, MatchDecision};
pub use revenue::RevenueSummary;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::database::models::{BookingRecord, BookingResult, CheckInRecord, CheckInResult};
use crate::database::table_repo::SqliteTableStore;
use crate::services::config::ReconcileSettings;
use crate::services::matching::Roster;
use crate::services::memory::MappingStore;
use crate::services::store::{
    append_merge, commit_plans, load_typed, plan_append_merge, MergePlan, ResilientStore,
    TableStore, BOOKINGS_TABLE, BOOKING_RAW_TABLE, CHECKINS_TABLE,
};
use crate::types::errors::ReconcileResult;

/// Summary of one persisted reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub dates: Vec<NaiveDate>,
    pub booking_rows: usize,
    pub checkin_rows: usize,
    pub bookings_inserted: usize,
    pub checkins_inserted: usize,
    pub errors: usize,
    #[serde(default)]
    pub booking_ingest: Option<IngestReport>,
    #[serde(default)]
    pub checkin_ingest: Option<IngestReport>,
    #[serde(default)]
    pub raw_archived: usize,
}

pub struct Reconciler<S> {
    store: S,
    settings: ReconcileSettings,
    roster: Roster,
}

impl Reconciler<ResilientStore<SqliteTableStore>> {
    /// Reconciler over a SQLite file, wrapped in the retrying cache
    /// configured by `settings.store`.
    pub async fn open_sqlite(path: &Path, settings: ReconcileSettings) -> ReconcileResult<Self> {
        let sqlite = SqliteTableStore::open(path).await?;
        let store = ResilientStore::from_settings(sqlite, &settings.store);
        Ok(Self::new(store, settings))
    }
}

impl<S: TableStore> Reconciler<S> {
    pub fn new(store: S, settings: ReconcileSettings) -> Self {
        let roster = Roster::new(&settings.employee_roster);
        Self {
            store,
            settings,
            roster,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// Classify one date with the current learned mappings, without
    /// persisting anything.
    pub async fn reconcile(
        &self,
        date: NaiveDate,
        bookings: &[BookingRecord],
        checkins: &[CheckInRecord],
    ) -> ReconcileResult<DayReconciliation> {
        let mappings = MappingStore::new(&self.store).load().await?;
        Ok(reconcile_day(
            date,
            bookings,
            checkins,
            &mappings,
            &self.roster,
            &self.settings,
        ))
    }

    /// Classify every date in the sources and append-merge the results.
    ///
    /// Both result tables are written in one batch: a failed run leaves the
    /// store as it was.
    pub async fn run(
        &self,
        bookings: &[BookingRecord],
        checkins: &[CheckInRecord],
    ) -> ReconcileResult<RunReport> {
        self.run_with(bookings, checkins, None).await
    }

    /// Archive the raw booking rows, prepare both sources and run. The raw
    /// archive is committed in the same batch as the results.
    pub async fn ingest_and_run(
        &self,
        raw_bookings: &[RawBookingRow],
        raw_checkins: &[RawCheckInRow],
    ) -> ReconcileResult<RunReport> {
        let existing_raw = self.store.read_table(BOOKING_RAW_TABLE).await?;
        let raw_plan = plan_append_merge(
            BOOKING_RAW_TABLE,
            existing_raw,
            raw_bookings,
            ingest::raw_archive_key,
        )?;

        let (bookings, booking_ingest) = ingest::prepare_bookings(raw_bookings, &self.settings);
        let (checkins, checkin_ingest) = ingest::prepare_checkins(raw_checkins);
        log::debug!(
            "Ingest: bookings kept {} skipped {}, check-ins kept {} skipped {}",
            booking_ingest.kept,
            booking_ingest.skipped(),
            checkin_ingest.kept,
            checkin_ingest.skipped()
        );

        let mut report = self.run_with(&bookings, &checkins, Some(raw_plan)).await?;
        report.booking_ingest = Some(booking_ingest);
        report.checkin_ingest = Some(checkin_ingest);
        Ok(report)
    }

    async fn run_with(
        &self,
        bookings: &[BookingRecord],
        checkins: &[CheckInRecord],
        raw_plan: Option<MergePlan>,
    ) -> ReconcileResult<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "[run {}] Reconciling {} booking(s), {} check-in(s)",
            run_id,
            bookings.len(),
            checkins.len()
        );

        let mappings = MappingStore::new(&self.store).load().await?;
        let days = reconcile_all(bookings, checkins, &mappings, &self.roster, &self.settings);

        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        let errors = days.iter().map(DayReconciliation::error_count).sum();
        let (booking_results, checkin_results): (Vec<BookingResult>, Vec<CheckInResult>) =
            days.into_iter().fold((Vec::new(), Vec::new()), |(mut b, mut c), day| {
                b.extend(day.bookings);
                c.extend(day.checkins);
                (b, c)
            });

        let existing_bookings = self.store.read_table(BOOKINGS_TABLE).await?;
        let existing_checkins = self.store.read_table(CHECKINS_TABLE).await?;
        let booking_plan = plan_append_merge(
            BOOKINGS_TABLE,
            existing_bookings,
            &booking_results,
            BookingResult::dedup_key,
        )?;
        let checkin_plan = plan_append_merge(
            CHECKINS_TABLE,
            existing_checkins,
            &checkin_results,
            CheckInResult::dedup_key,
        )?;

        let report = RunReport {
            run_id: run_id.clone(),
            dates,
            booking_rows: booking_results.len(),
            checkin_rows: checkin_results.len(),
            bookings_inserted: booking_plan.inserted,
            checkins_inserted: checkin_plan.inserted,
            errors,
            raw_archived: raw_plan.as_ref().map_or(0, |plan| plan.inserted),
            ..Default::default()
        };

        let mut plans = vec![booking_plan, checkin_plan];
        plans.extend(raw_plan);
        if let Err(e) = commit_plans(&self.store, plans).await {
            log::error!("[run {}] Aborted, nothing persisted: {}", run_id, e);
            return Err(e.into());
        }

        log::info!(
            "[run {}] {} day(s), {} error(s), {} new booking row(s), {} new check-in row(s), {} raw row(s) archived",
            run_id,
            report.dates.len(),
            report.errors,
            report.bookings_inserted,
            report.checkins_inserted,
            report.raw_archived
        );
        Ok(report)
    }

    /// Append un-filtered booking rows to the raw archive on their own.
    pub async fn archive_raw(&self, rows: &[RawBookingRow]) -> ReconcileResult<usize> {
        Ok(append_merge(&self.store, BOOKING_RAW_TABLE, rows, ingest::raw_archive_key).await?)
    }

    // ─── Persisted results ───────────────────────────────────────────────────

    /// Dates with persisted booking results, newest first.
    pub async fn analysis_dates(&self) -> ReconcileResult<Vec<NaiveDate>> {
        let bookings: Vec<BookingResult> = load_typed(&self.store, BOOKINGS_TABLE).await?;
        let dates: BTreeSet<NaiveDate> = bookings.iter().map(|b| b.analysis_date).collect();
        Ok(dates.into_iter().rev().collect())
    }

    /// Persisted results of one date.
    pub async fn snapshot(&self, date: NaiveDate) -> ReconcileResult<DayReconciliation> {
        let bookings: Vec<BookingResult> = load_typed(&self.store, BOOKINGS_TABLE).await?;
        let checkins: Vec<CheckInResult> = load_typed(&self.store, CHECKINS_TABLE).await?;
        Ok(DayReconciliation {
            date,
            bookings: bookings
                .into_iter()
                .filter(|b| b.analysis_date == date)
                .collect(),
            checkins: checkins
                .into_iter()
                .filter(|c| c.analysis_date == date)
                .collect(),
        })
    }

    /// Revenue of the archived raw booking rows with a service date in
    /// `range`. A single day is `date..=date`.
    pub async fn revenue(&self, range: RangeInclusive<NaiveDate>) -> ReconcileResult<RevenueSummary> {
        let rows: Vec<RawBookingRow> = load_typed(&self.store, BOOKING_RAW_TABLE).await?;
        Ok(revenue::summarize_revenue(&rows, &range))
    }

    /// Distinct people who checked in on `date`.
    pub async fn unique_checkins(&self, date: NaiveDate) -> ReconcileResult<usize> {
        let checkins: Vec<CheckInResult> = load_typed(&self.store, CHECKINS_TABLE).await?;
        Ok(checkins
            .iter()
            .filter(|c| c.analysis_date == date)
            .map(|c| c.name_norm.as_str())
            .collect::<HashSet<_>>()
            .len())
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
