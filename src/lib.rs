pub mod database;
pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

pub use services::config::{ConfigService, ReconcileSettings};
pub use services::reconcile::{DayReconciliation, Reconciler, RunReport};
pub use types::errors::{ReconcileError, ReconcileResult, StoreError};
