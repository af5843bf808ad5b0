use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CorrectionTracker;
use crate::database::models::BookingResult;
use crate::services::store::{load_typed, TableStore, BOOKINGS_TABLE};
use crate::types::errors::StoreError;

pub const DEFAULT_WINDOW_DAYS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenError {
    pub key: String,
    pub booking: BookingResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenErrorDay {
    pub date: NaiveDate,
    pub errors: Vec<OpenError>,
}

/// Unresolved errors of the `days` dates before `reference` (the reference
/// date itself excluded), grouped per date, newest date first.
pub async fn open_errors_in_window<S: TableStore>(
    store: &S,
    reference: NaiveDate,
    days: u32,
) -> Result<Vec<OpenErrorDay>, StoreError> {
    let Some(start) = reference.checked_sub_days(Days::new(u64::from(days))) else {
        return Ok(Vec::new());
    };

    let bookings: Vec<BookingResult> = load_typed(store, BOOKINGS_TABLE).await?;
    let corrections = CorrectionTracker::new(store).load().await?;

    let mut by_date: BTreeMap<NaiveDate, Vec<OpenError>> = BTreeMap::new();
    for booking in bookings {
        if !booking.is_error || booking.analysis_date < start || booking.analysis_date >= reference {
            continue;
        }
        let key = booking.natural_key();
        if corrections.get(&key).is_some_and(|entry| entry.resolved) {
            continue;
        }
        by_date
            .entry(booking.analysis_date)
            .or_default()
            .push(OpenError { key, booking });
    }

    Ok(by_date
        .into_iter()
        .rev()
        .map(|(date, errors)| OpenErrorDay { date, errors })
        .collect())
}

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
