//! Per-day classification of bookings and check-ins.
//!
//! Pure: all state (mappings, roster, settings) is passed in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::database::models::{
    BookingRecord, BookingResult, CheckInRecord, CheckInResult, NameMapping,
};
use crate::services::config::ReconcileSettings;
use crate::services::matching::Roster;

/// Classified output of one analysis date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayReconciliation {
    pub date: NaiveDate,
    pub bookings: Vec<BookingResult>,
    pub checkins: Vec<CheckInResult>,
}

impl DayReconciliation {
    pub fn errors(&self) -> impl Iterator<Item = &BookingResult> {
        self.bookings.iter().filter(|b| b.is_error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Whether a booking is expected to carry a check-in.
///
/// `0 < amount < ceiling` or exactly zero. A present payment-method tag that
/// names an internal wallet makes the booking irrelevant; an absent tag
/// never does.
pub fn is_relevant(amount: f64, payment_method: Option<&str>, settings: &ReconcileSettings) -> bool {
    let in_range = amount == 0.0 || (amount > 0.0 && amount < settings.relevance_ceiling);
    let wallet = payment_method
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .is_some_and(|m| settings.is_wallet_method(m));
    in_range && !wallet
}

/// Every date present in either source, ascending.
pub fn all_dates(bookings: &[BookingRecord], checkins: &[CheckInRecord]) -> Vec<NaiveDate> {
    bookings
        .iter()
        .map(|b| b.date)
        .chain(checkins.iter().map(|c| c.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Check-ins of one date, one per normalized name, first occurrence kept.
fn dedup_checkins<'a>(checkins: &'a [CheckInRecord], date: NaiveDate) -> Vec<&'a CheckInRecord> {
    let mut seen = HashSet::new();
    checkins
        .iter()
        .filter(|c| c.date == date)
        .filter(|c| seen.insert(c.name_norm.as_str()))
        .collect()
}

pub fn reconcile_day(
    date: NaiveDate,
    bookings: &[BookingRecord],
    checkins: &[CheckInRecord],
    mappings: &HashMap<String, NameMapping>,
    roster: &Roster,
    settings: &ReconcileSettings,
) -> DayReconciliation {
    let day_checkins = dedup_checkins(checkins, date);
    let by_name: HashMap<&str, &CheckInRecord> = day_checkins
        .iter()
        .map(|c| (c.name_norm.as_str(), *c))
        .collect();

    let day_bookings: Vec<&BookingRecord> = bookings.iter().filter(|b| b.date == date).collect();

    let booking_results: Vec<BookingResult> = day_bookings
        .iter()
        .map(|booking| {
            let matched = by_name.get(booking.name_norm.as_str()).copied().or_else(|| {
                mappings
                    .get(&booking.name_norm)
                    .and_then(|m| by_name.get(m.target.as_str()).copied())
            });

            let mut result = BookingResult::from_record(booking);
            result.analysis_date = date;
            result.is_employee = roster.contains(&booking.name);
            result.is_relevant =
                is_relevant(booking.amount, booking.payment_method.as_deref(), settings);
            result.has_checkin = matched.is_some();
            result.checkin_time = matched.and_then(|c| c.time);
            result.is_error = result.is_relevant && !result.has_checkin && !result.is_employee;
            result
        })
        .collect();

    let booked: HashSet<&str> = day_bookings.iter().map(|b| b.name_norm.as_str()).collect();
    let exempt = Roster::new(&settings.exempt_checkins);
    let checkin_results: Vec<CheckInResult> = day_checkins
        .iter()
        .map(|c| CheckInResult {
            analysis_date: date,
            name: c.name.clone(),
            name_norm: c.name_norm.clone(),
            checkin_time: c.time,
            played: booked.contains(c.name_norm.as_str()),
            exempt: exempt.contains(&c.name),
        })
        .collect();

    DayReconciliation {
        date,
        bookings: booking_results,
        checkins: checkin_results,
    }
}

/// Reconcile every date present in either source, ascending by date.
pub fn reconcile_all(
    bookings: &[BookingRecord],
    checkins: &[CheckInRecord],
    mappings: &HashMap<String, NameMapping>,
    roster: &Roster,
    settings: &ReconcileSettings,
) -> Vec<DayReconciliation> {
    all_dates(bookings, checkins)
        .into_iter()
        .map(|date| reconcile_day(date, bookings, checkins, mappings, roster, settings))
        .collect()
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
