//! Retry + read-cache wrapper around any [`TableStore`].
//!
//! Reads are served from an LRU cache while younger than the table's TTL.
//! Transient failures (rate limiting, pool timeouts) are retried with
//! exponential backoff plus random jitter, up to `max_retries` extra
//! attempts. Every write drops the written tables from the cache before
//! returning, whether it succeeded or not.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, warn};
use lru::LruCache;
use rand::Rng;

use super::{Row, TableStore};
use crate::services::config::StoreSettings;
use crate::types::errors::StoreError;

const CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based): `base * 2^attempt + jitter`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        backoff + jitter
    }
}

struct CachedTable {
    rows: Vec<Row>,
    cached_at: Instant,
}

pub struct ResilientStore<S> {
    inner: S,
    policy: RetryPolicy,
    default_ttl: Duration,
    table_ttls: HashMap<String, Duration>,
    cache: Mutex<LruCache<String, CachedTable>>,
}

impl<S: TableStore> ResilientStore<S> {
    pub fn new(inner: S, policy: RetryPolicy, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            policy,
            default_ttl,
            table_ttls: HashMap::new(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_settings(inner: S, settings: &StoreSettings) -> Self {
        let policy = RetryPolicy {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_backoff_ms),
            max_jitter: Duration::from_millis(settings.max_jitter_ms),
        };
        let mut store = Self::new(
            inner,
            policy,
            Duration::from_secs(settings.cache_ttl_secs),
        );
        for (table, secs) in &settings.table_ttl_secs {
            store = store.with_table_ttl(table, Duration::from_secs(*secs));
        }
        store
    }

    /// Override the cache TTL of one table. A zero TTL disables caching for it.
    pub fn with_table_ttl(mut self, table: &str, ttl: Duration) -> Self {
        self.table_ttls.insert(table.to_string(), ttl);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn invalidate(&self, table: &str) {
        self.lock_cache().pop(table);
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedTable>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ttl_for(&self, table: &str) -> Duration {
        self.table_ttls
            .get(table)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    fn cached(&self, table: &str) -> Option<Vec<Row>> {
        let ttl = self.ttl_for(table);
        let mut cache = self.lock_cache();
        if let Some(entry) = cache.get(table) {
            if entry.cached_at.elapsed() < ttl {
                return Some(entry.rows.clone());
            }
            cache.pop(table);
        }
        None
    }

    async fn with_retry<T, F, Fut>(&self, table: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt >= self.policy.max_retries {
                        return Err(StoreError::RetriesExhausted {
                            table: table.to_string(),
                            attempts: attempt + 1,
                            last: e.to_string(),
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Store busy on '{}' ({}), retry {}/{} in {:?}",
                        table,
                        e,
                        attempt + 1,
                        self.policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<S: TableStore> TableStore for ResilientStore<S> {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        if let Some(rows) = self.cached(table) {
            debug!("[Store] cache hit for '{}'", table);
            return Ok(rows);
        }

        let rows = self
            .with_retry(table, move || self.inner.read_table(table))
            .await?;

        if !self.ttl_for(table).is_zero() {
            self.lock_cache().put(
                table.to_string(),
                CachedTable {
                    rows: rows.clone(),
                    cached_at: Instant::now(),
                },
            );
        }
        Ok(rows)
    }

    async fn write_table(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let result = self
            .with_retry(table, move || self.inner.write_table(table, rows))
            .await;
        self.invalidate(table);
        result
    }

    async fn write_tables(&self, batch: &[(String, Vec<Row>)]) -> Result<(), StoreError> {
        let label = batch
            .iter()
            .map(|(table, _)| table.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let result = self
            .with_retry(&label, move || self.inner.write_tables(batch))
            .await;
        for (table, _) in batch {
            self.invalidate(table);
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/resilient_tests.rs"]
mod tests;
