pub mod config;
pub mod corrections;
pub mod customers;
pub mod matching;
pub mod memory;
pub mod reconcile;
pub mod store;
