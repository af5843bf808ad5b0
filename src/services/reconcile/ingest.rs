//! Conversion of already-parsed source rows into typed records.
//!
//! Every field of a raw row is optional. Missing fields become absent
//! values; only rows without a usable name or date are skipped.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::database::models::{BookingRecord, CheckInRecord};
use crate::services::config::ReconcileSettings;
use crate::services::matching::normalize;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}):(\d{2})").expect("valid time regex"));
static THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d{1,3}(\.\d{3})+$").expect("valid thousands regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y", "%Y%m%d"];

const REFUND_STATUS: &str = "Refund";

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// One row of the booking export, column names as the feed delivers them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBookingRow {
    #[serde(rename = "User name", default)]
    pub user_name: Option<String>,
    #[serde(rename = "Total", default)]
    pub total: Option<String>,
    #[serde(rename = "Service date", default)]
    pub service_date: Option<String>,
    #[serde(rename = "Service time", default)]
    pub service_time: Option<String>,
    #[serde(rename = "Product SKU", default)]
    pub product_sku: Option<String>,
    #[serde(rename = "Sport", default)]
    pub sport: Option<String>,
    #[serde(rename = "Payment method", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "Payment status", default)]
    pub payment_status: Option<String>,
    #[serde(rename = "Refund id", default)]
    pub refund_id: Option<String>,
    #[serde(rename = "Payment id", default)]
    pub payment_id: Option<String>,
    #[serde(rename = "Club payment id", default)]
    pub club_payment_id: Option<String>,
}

impl RawBookingRow {
    fn is_refund(&self) -> bool {
        let refunded = non_empty(self.refund_id.as_deref()).is_some_and(|id| id != "-");
        let status = self
            .payment_status
            .as_deref()
            .is_some_and(|s| s.trim() == REFUND_STATUS);
        refunded || status
    }
}

/// One row of the check-in export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCheckInRow {
    #[serde(rename = "Vor- & Nachname", alias = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Datum", alias = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Zeit", alias = "Time", default)]
    pub time: Option<String>,
}

// ─── Field parsing ───────────────────────────────────────────────────────────

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an amount such as `"1.234,50 €"`, `"5,00"` or `"5.00"`.
/// Unparseable input is 0.
///
/// With a comma present, dots are thousands separators. Without one, a dot
/// is a decimal point unless it groups exactly three digits (`"1.234"`).
pub fn parse_amount(raw: &str) -> f64 {
    let compact: String = raw.replace('€', "").split_whitespace().collect();
    let cleaned = if compact.contains(',') || THOUSANDS_RE.is_match(&compact) {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a calendar date from the formats seen in both feeds.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() || value == "-" {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// First `HH:MM` found in `raw`.
pub fn extract_time(raw: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(raw)?;
    let hours = caps.get(1)?.as_str().parse().ok()?;
    let minutes = caps.get(2)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Time-of-day from the explicit field, else from the raw date string.
pub fn resolve_time(explicit: Option<&str>, raw_date: Option<&str>) -> Option<NaiveTime> {
    non_empty(explicit)
        .and_then(extract_time)
        .or_else(|| raw_date.and_then(extract_time))
}

/// Archive key of a raw booking row: `payment|club`, or `CLUB-club` when
/// the payment id is missing.
pub fn raw_archive_key(row: &RawBookingRow) -> String {
    let club = non_empty(row.club_payment_id.as_deref()).unwrap_or_default();
    match non_empty(row.payment_id.as_deref()) {
        Some(payment) => format!("{payment}|{club}"),
        None => format!("CLUB-{club}"),
    }
}

// ─── Preparation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub kept: usize,
    pub skipped_product: usize,
    pub skipped_refund: usize,
    pub skipped_negative: usize,
    pub skipped_duplicate: usize,
    pub skipped_unparseable: usize,
}

impl IngestReport {
    pub fn skipped(&self) -> usize {
        self.skipped_product
            + self.skipped_refund
            + self.skipped_negative
            + self.skipped_duplicate
            + self.skipped_unparseable
    }
}

pub fn prepare_bookings(
    rows: &[RawBookingRow],
    settings: &ReconcileSettings,
) -> (Vec<BookingRecord>, IngestReport) {
    let mut report = IngestReport::default();
    let mut seen_payments: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for row in rows {
        if !settings.is_relevant_product(row.product_sku.as_deref()) {
            report.skipped_product += 1;
            continue;
        }
        if row.is_refund() {
            report.skipped_refund += 1;
            continue;
        }

        let name = non_empty(row.user_name.as_deref());
        let date = row.service_date.as_deref().and_then(parse_date);
        let (Some(name), Some(date)) = (name, date) else {
            report.skipped_unparseable += 1;
            continue;
        };
        if normalize(name).is_empty() {
            report.skipped_unparseable += 1;
            continue;
        }

        let amount = row.total.as_deref().map(parse_amount).unwrap_or(0.0);
        if amount < 0.0 {
            report.skipped_negative += 1;
            continue;
        }

        let payment_id = non_empty(row.payment_id.as_deref()).map(str::to_string);
        if let Some(id) = &payment_id {
            if !seen_payments.insert(id.clone()) {
                report.skipped_duplicate += 1;
                continue;
            }
        }

        let mut record = BookingRecord::new(name, date, amount);
        record.time = resolve_time(row.service_time.as_deref(), row.service_date.as_deref());
        record.product = non_empty(row.product_sku.as_deref()).map(str::to_string);
        record.sport = non_empty(row.sport.as_deref()).map(str::to_string);
        record.payment_method = non_empty(row.payment_method.as_deref()).map(str::to_string);
        record.payment_id = payment_id;
        record.club_payment_id = non_empty(row.club_payment_id.as_deref()).map(str::to_string);
        records.push(record);
        report.kept += 1;
    }

    (records, report)
}

pub fn prepare_checkins(rows: &[RawCheckInRow]) -> (Vec<CheckInRecord>, IngestReport) {
    let mut report = IngestReport::default();
    let mut records = Vec::new();

    for row in rows {
        let name = non_empty(row.name.as_deref()).filter(|n| !normalize(n).is_empty());
        let date = row.date.as_deref().and_then(parse_date);
        let (Some(name), Some(date)) = (name, date) else {
            report.skipped_unparseable += 1;
            continue;
        };

        let mut record = CheckInRecord::new(name, date);
        record.time = resolve_time(row.time.as_deref(), row.date.as_deref());
        records.push(record);
        report.kept += 1;
    }

    (records, report)
}

#[cfg(test)]
#[path = "tests/ingest_tests.rs"]
mod tests;
