#![allow(dead_code)]

use chrono::NaiveDate;
use courtcheck_lib::database::table_repo::SqliteTableStore;
use courtcheck_lib::services::store::{ResilientStore, RetryPolicy};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

pub async fn init_test_db() -> TestContext {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestContext { pool }
}

/// SQLite store behind the retrying cache, with millisecond backoff.
pub async fn resilient_store() -> ResilientStore<SqliteTableStore> {
    let ctx = init_test_db().await;
    ResilientStore::new(
        SqliteTableStore::new(ctx.pool),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        },
        Duration::from_secs(60),
    )
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
