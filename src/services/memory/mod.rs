//! Persistent human decisions: learned name mappings and rejected pairs.
//!
//! Both stores normalize names at their boundary, so callers may pass raw or
//! normalized names.

pub mod mapping_store;
pub mod rejection_store;

pub use mapping_store::{MappingEntry, MappingStore};
pub use rejection_store::RejectionStore;
