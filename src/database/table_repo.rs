use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;

use crate::services::store::{Row, TableStore};
use crate::types::errors::StoreError;

/// [`TableStore`] over the `store_rows` table: one SQLite row per stored
/// row, JSON payload, ordered by `row_index`.
#[derive(Debug, Clone)]
pub struct SqliteTableStore {
    pool: SqlitePool,
}

impl SqliteTableStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) a database file and apply migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        log::info!("Opened table store at {}", path.display());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ── Row access ──────────────────────────────────────────────

/// Fetch the raw JSON payloads of one table in stored order.
pub async fn read_payloads(pool: &SqlitePool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT payload FROM store_rows WHERE table_name = ? ORDER BY row_index",
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}

async fn replace_table(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    rows: &[Row],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM store_rows WHERE table_name = ?")
        .bind(table)
        .execute(&mut **tx)
        .await?;
    for (index, row) in rows.iter().enumerate() {
        let payload = serde_json::to_string(row)?;
        sqlx::query("INSERT INTO store_rows (table_name, row_index, payload) VALUES (?, ?, ?)")
            .bind(table)
            .bind(index as i64)
            .bind(payload)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

impl TableStore for SqliteTableStore {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let payloads = read_payloads(&self.pool, table).await?;
        let mut rows = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match serde_json::from_str::<Row>(&payload) {
                Ok(row) => rows.push(row),
                Err(e) => log::warn!("Dropping unreadable payload in '{table}': {e}"),
            }
        }
        Ok(rows)
    }

    async fn write_table(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        replace_table(&mut tx, table, rows).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_tables(&self, batch: &[(String, Vec<Row>)]) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for (table, rows) in batch {
            replace_table(&mut tx, table, rows).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/table_repo_test.rs"]
mod tests;
