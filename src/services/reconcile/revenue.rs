use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::ingest::{parse_amount, parse_date, RawBookingRow};

// ── Response Structs ────────────────────────────────────────────────────────

/// Revenue split by sport and product category.
///
/// `total` covers every archived row in range. The sport and product
/// columns only count rows carrying the matching tag, so they need not add
/// up to `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub rows: usize,
    pub total: f64,
    pub padel: f64,
    pub tennis: f64,
    pub court_booking: f64,
    pub balls: f64,
    pub racket: f64,
    pub other: f64,
}

/// Product category of a raw row's SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    CourtBooking,
    Balls,
    Racket,
    Other,
}

pub fn product_category(sku: &str) -> ProductCategory {
    if sku.contains("User booking") || sku.contains("Open match") {
        ProductCategory::CourtBooking
    } else if sku.contains("BALLS") {
        ProductCategory::Balls
    } else if sku.contains("RACKET") {
        ProductCategory::Racket
    } else {
        ProductCategory::Other
    }
}

// ── Aggregation ─────────────────────────────────────────────────────────────

/// Sum archived rows whose service date falls in `range`. Rows without a
/// parseable service date are ignored.
pub fn summarize_revenue(rows: &[RawBookingRow], range: &RangeInclusive<NaiveDate>) -> RevenueSummary {
    let mut summary = RevenueSummary::default();

    for row in rows {
        let Some(date) = row.service_date.as_deref().and_then(parse_date) else {
            continue;
        };
        if !range.contains(&date) {
            continue;
        }

        let amount = row.total.as_deref().map(parse_amount).unwrap_or(0.0);
        summary.rows += 1;
        summary.total += amount;

        match row.sport.as_deref().map(|s| s.trim().to_uppercase()).as_deref() {
            Some("PADEL") => summary.padel += amount,
            Some("TENNIS") => summary.tennis += amount,
            _ => {}
        }

        if let Some(sku) = row.product_sku.as_deref().filter(|s| !s.trim().is_empty()) {
            match product_category(sku) {
                ProductCategory::CourtBooking => summary.court_booking += amount,
                ProductCategory::Balls => summary.balls += amount,
                ProductCategory::Racket => summary.racket += amount,
                ProductCategory::Other => summary.other += amount,
            }
        }
    }

    summary
}

#[cfg(test)]
#[path = "tests/revenue_tests.rs"]
mod tests;
