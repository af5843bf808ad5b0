use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::Once;

use crate::database::table_repo::SqliteTableStore;

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

impl TestContext {
    /// Table store sharing this context's pool.
    pub fn table_store(&self) -> SqliteTableStore {
        SqliteTableStore::new(self.pool.clone())
    }
}

pub async fn init_test_db() -> TestContext {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });

    // Create an in-memory database for each test
    let pool = SqlitePoolOptions::new()
        .max_connections(1) // Single connection so every query sees the same in-memory DB
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestContext { pool }
}
