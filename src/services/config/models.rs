use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::matching::RankConfig;
use crate::services::store::CORRECTIONS_TABLE;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    pub cache_ttl_secs: u64,
    /// Per-table TTL overrides; `0` disables caching for that table.
    pub table_ttl_secs: HashMap<String, u64>,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            // Resolution status changes often; keep it fresher than the rest.
            table_ttl_secs: HashMap::from([(CORRECTIONS_TABLE.to_string(), 60)]),
            max_retries: 3,
            base_backoff_ms: 1000,
            max_jitter_ms: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReconcileSettings {
    /// Staff names; bookings by these people are never errors.
    pub employee_roster: Vec<String>,
    /// Check-in names exempt from the booking requirement (family, guests).
    /// Flagged on the check-in result; `played` is unaffected.
    #[serde(default)]
    pub exempt_checkins: Vec<String>,
    /// Case-insensitive substrings of the payment-method tag meaning "internal wallet".
    pub wallet_markers: Vec<String>,
    /// Exclusive upper bound of a relevant amount.
    pub relevance_ceiling: f64,
    /// Product tags kept at ingestion. Empty keeps everything.
    pub relevant_products: Vec<String>,
    pub ranking: RankConfig,
    pub store: StoreSettings,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            employee_roster: Vec::new(),
            exempt_checkins: Vec::new(),
            wallet_markers: vec!["wallet".into()],
            relevance_ceiling: 6.0,
            relevant_products: vec![
                "User booking registration".into(),
                "Open match registration".into(),
            ],
            ranking: RankConfig::default(),
            store: StoreSettings::default(),
        }
    }
}

impl ReconcileSettings {
    pub fn is_wallet_method(&self, payment_method: &str) -> bool {
        let method = payment_method.to_lowercase();
        self.wallet_markers
            .iter()
            .any(|marker| method.contains(&marker.to_lowercase()))
    }

    pub fn is_relevant_product(&self, product: Option<&str>) -> bool {
        if self.relevant_products.is_empty() {
            return true;
        }
        product
            .map(str::trim)
            .is_some_and(|p| self.relevant_products.iter().any(|known| known == p))
    }
}
