pub mod models;

pub use models::*;

use crate::database::settings_repo;
use crate::types::errors::{ReconcileError, ReconcileResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;

const KEY_EMPLOYEE_ROSTER: &str = "employee_roster";
const KEY_EXEMPT_CHECKINS: &str = "exempt_checkins";
const KEY_WALLET_MARKERS: &str = "wallet_markers";
const KEY_RELEVANCE_CEILING: &str = "relevance_ceiling";
const KEY_RELEVANT_PRODUCTS: &str = "relevant_products";
const KEY_RANKING: &str = "ranking";
const KEY_STORE: &str = "store";

pub struct ConfigService {
    pool: SqlitePool,
    settings: Mutex<ReconcileSettings>,
}

impl ConfigService {
    /// Load settings from the `app_settings` table. Missing or unreadable
    /// keys fall back to their defaults.
    pub async fn load(pool: SqlitePool) -> Self {
        let settings = Self::load_from_db(&pool).await;
        Self {
            pool,
            settings: Mutex::new(settings),
        }
    }

    async fn load_from_db(pool: &SqlitePool) -> ReconcileSettings {
        let kv = match settings_repo::get_all_settings(pool).await {
            Ok(m) => m,
            Err(e) => {
                log::error!("Failed to load settings from DB: {e}");
                return ReconcileSettings::default();
            }
        };

        let defaults = ReconcileSettings::default();
        ReconcileSettings {
            employee_roster: read_key(&kv, KEY_EMPLOYEE_ROSTER, defaults.employee_roster),
            exempt_checkins: read_key(&kv, KEY_EXEMPT_CHECKINS, defaults.exempt_checkins),
            wallet_markers: read_key(&kv, KEY_WALLET_MARKERS, defaults.wallet_markers),
            relevance_ceiling: read_key(&kv, KEY_RELEVANCE_CEILING, defaults.relevance_ceiling),
            relevant_products: read_key(&kv, KEY_RELEVANT_PRODUCTS, defaults.relevant_products),
            ranking: read_key(&kv, KEY_RANKING, defaults.ranking),
            store: read_key(&kv, KEY_STORE, defaults.store),
        }
    }

    async fn write_settings_to_db(
        pool: &SqlitePool,
        settings: &ReconcileSettings,
    ) -> ReconcileResult<()> {
        let entries = [
            (KEY_EMPLOYEE_ROSTER, to_json(&settings.employee_roster)?),
            (KEY_EXEMPT_CHECKINS, to_json(&settings.exempt_checkins)?),
            (KEY_WALLET_MARKERS, to_json(&settings.wallet_markers)?),
            (KEY_RELEVANCE_CEILING, to_json(&settings.relevance_ceiling)?),
            (KEY_RELEVANT_PRODUCTS, to_json(&settings.relevant_products)?),
            (KEY_RANKING, to_json(&settings.ranking)?),
            (KEY_STORE, to_json(&settings.store)?),
        ];
        settings_repo::set_settings(pool, &entries).await?;
        Ok(())
    }

    pub fn get_settings(&self) -> ReconcileSettings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub async fn save_settings(&self, mut new_settings: ReconcileSettings) -> ReconcileResult<()> {
        validate(&new_settings)?;
        new_settings.wallet_markers = normalize_keywords(&new_settings.wallet_markers);
        new_settings.employee_roster = clean_names(&new_settings.employee_roster);
        new_settings.exempt_checkins = clean_names(&new_settings.exempt_checkins);
        new_settings.relevant_products = clean_names(&new_settings.relevant_products);

        Self::write_settings_to_db(&self.pool, &new_settings).await?;

        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_settings;
        Ok(())
    }

    pub async fn set_employee_roster(&self, names: Vec<String>) -> ReconcileResult<()> {
        let mut settings = self.get_settings();
        settings.employee_roster = names;
        self.save_settings(settings).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ── Helpers ──────────────────────────────────────────

fn read_key<T: DeserializeOwned>(kv: &HashMap<String, String>, key: &str, default: T) -> T {
    match kv.get(key) {
        None => default,
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Ignoring unreadable setting '{key}': {e}");
                default
            }
        },
    }
}

fn to_json<T: Serialize>(value: &T) -> ReconcileResult<String> {
    serde_json::to_string(value).map_err(|e| ReconcileError::Config(e.to_string()))
}

fn validate(settings: &ReconcileSettings) -> ReconcileResult<()> {
    if !settings.relevance_ceiling.is_finite() || settings.relevance_ceiling <= 0.0 {
        return Err(ReconcileError::Config(format!(
            "relevance ceiling must be a positive amount, got {}",
            settings.relevance_ceiling
        )));
    }
    if settings.ranking.limit == 0 {
        return Err(ReconcileError::Config(
            "suggestion limit must be at least 1".into(),
        ));
    }
    Ok(())
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for keyword in keywords {
        let next = keyword.trim().to_lowercase();
        if next.is_empty() || normalized.contains(&next) {
            continue;
        }
        normalized.push(next);
    }

    normalized
}

fn clean_names(names: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for name in names {
        let next = name.trim().to_string();
        if next.is_empty() || cleaned.contains(&next) {
            continue;
        }
        cleaned.push(next);
    }
    cleaned
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
