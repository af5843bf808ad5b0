use serde::Serialize;
use thiserror::Error;

/// Failures of the persistent table store.
///
/// Only this class of error propagates out of the reconciliation core;
/// matching and scoring never fail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Table '{table}' still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        table: String,
        attempts: u32,
        last: String,
    },
}

impl StoreError {
    /// Whether the retry policy should try the call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::RateLimited(_) | StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            // SQLITE_BUSY (5) / SQLITE_LOCKED (6): another writer holds the file.
            sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("5") | Some("6")) => {
                StoreError::RateLimited(error.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                StoreError::Unavailable(error.to_string())
            }
            _ => StoreError::Database(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for ReconcileError {
    fn from(error: sqlx::Error) -> Self {
        ReconcileError::Store(StoreError::from(error))
    }
}

impl Serialize for ReconcileError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
