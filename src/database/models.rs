use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::matching::normalizer::normalize;

/// Format a time-of-day the way it appears in dedup keys (`HH:MM`, empty if absent).
pub fn time_key(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Format an amount the way it appears in natural keys (two decimals).
pub fn amount_key(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Natural key of a booking for correction tracking: `name_date_amount`.
pub fn natural_key(name_norm: &str, date: NaiveDate, amount: f64) -> String {
    format!("{}_{}_{}", name_norm, date, amount_key(amount))
}

// ─── Source records ──────────────────────────────────────────────────────────

/// One paid activity reservation from the booking feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub name: String,
    pub name_norm: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub amount: f64,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub club_payment_id: Option<String>,
}

impl BookingRecord {
    pub fn new(name: &str, date: NaiveDate, amount: f64) -> Self {
        Self {
            name: name.to_string(),
            name_norm: normalize(name),
            date,
            time: None,
            amount,
            product: None,
            sport: None,
            payment_method: None,
            payment_id: None,
            club_payment_id: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_payment_method(mut self, method: &str) -> Self {
        self.payment_method = Some(method.to_string());
        self
    }

    pub fn with_sport(mut self, sport: &str) -> Self {
        self.sport = Some(sport.to_string());
        self
    }

    pub fn natural_key(&self) -> String {
        natural_key(&self.name_norm, self.date, self.amount)
    }
}

/// One check-in event from the wellness-plan feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub name: String,
    pub name_norm: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

impl CheckInRecord {
    pub fn new(name: &str, date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            name_norm: normalize(name),
            date,
            time: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }
}

// ─── Learned memory ──────────────────────────────────────────────────────────

/// Who (or what) established a learned mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingOrigin {
    Auto,
    User,
    Manual,
    Legacy,
}

impl fmt::Display for MappingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingOrigin::Auto => write!(f, "auto"),
            MappingOrigin::User => write!(f, "user"),
            MappingOrigin::Manual => write!(f, "manual"),
            MappingOrigin::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for MappingOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(MappingOrigin::Auto),
            "user" => Ok(MappingOrigin::User),
            "manual" => Ok(MappingOrigin::Manual),
            "legacy" => Ok(MappingOrigin::Legacy),
            _ => Err(format!("Unknown mapping origin: {s}")),
        }
    }
}

/// A confirmed booking-name → check-in-name equivalence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMapping {
    pub target: String,
    /// 0–100.
    pub confidence: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub origin: MappingOrigin,
}

/// Ordered pair a human declared "not the same person".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RejectedPair {
    pub booking_name: String,
    pub checkin_name: String,
}

impl RejectedPair {
    pub fn new(booking_name: &str, checkin_name: &str) -> Self {
        Self {
            booking_name: booking_name.to_string(),
            checkin_name: checkin_name.to_string(),
        }
    }
}

// ─── Pipeline output ─────────────────────────────────────────────────────────

/// Classification of one booking row for one analysis date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResult {
    pub analysis_date: NaiveDate,
    pub name: String,
    pub name_norm: String,
    pub amount: f64,
    #[serde(default)]
    pub service_time: Option<NaiveTime>,
    #[serde(default)]
    pub checkin_time: Option<NaiveTime>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub club_payment_id: Option<String>,
    pub is_relevant: bool,
    pub has_checkin: bool,
    pub is_employee: bool,
    pub is_error: bool,
}

impl BookingResult {
    /// Copy the booking's fields with every flag cleared.
    pub fn from_record(record: &BookingRecord) -> Self {
        Self {
            analysis_date: record.date,
            name: record.name.clone(),
            name_norm: record.name_norm.clone(),
            amount: record.amount,
            service_time: record.time,
            checkin_time: None,
            product: record.product.clone(),
            sport: record.sport.clone(),
            payment_method: record.payment_method.clone(),
            payment_id: record.payment_id.clone(),
            club_payment_id: record.club_payment_id.clone(),
            is_relevant: false,
            has_checkin: false,
            is_employee: false,
            is_error: false,
        }
    }

    pub fn natural_key(&self) -> String {
        natural_key(&self.name_norm, self.analysis_date, self.amount)
    }

    /// Append-merge key: `date|name|time`.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.analysis_date,
            self.name_norm,
            time_key(self.service_time)
        )
    }
}

/// One deduplicated check-in for one analysis date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInResult {
    pub analysis_date: NaiveDate,
    pub name: String,
    pub name_norm: String,
    #[serde(default)]
    pub checkin_time: Option<NaiveTime>,
    pub played: bool,
    /// On the exemption list; displayed as fine whether or not `played`.
    #[serde(default)]
    pub exempt: bool,
}

impl CheckInResult {
    /// Append-merge key: `date|name|time`.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.analysis_date,
            self.name_norm,
            time_key(self.checkin_time)
        )
    }
}

// ─── Corrections & directory ─────────────────────────────────────────────────

/// Stored resolution of one error, keyed by its natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub key: String,
    pub date: NaiveDate,
    pub resolved: bool,
    pub timestamp: DateTime<Utc>,
}

/// Contact details from the customer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "category_name")]
    pub category: Option<String>,
}

#[cfg(test)]
#[path = "tests/models_tests.rs"]
mod tests;
