//! Cache Module
//!
//! Persistent tile storage with time-based expiration over interchangeable
//! backends: an embedded record store, a relational table and a directory
//! tree.

mod backend;
mod embedded;
pub mod entry;
mod filesystem;
mod memory;
mod relational;
pub mod repair;
mod stats;
mod store;

#[cfg(test)]
mod test_support;

// Re-export public types
pub use backend::{BackendKind, StorageBackend, DEFAULT_FILE_STEM};
pub use embedded::EmbeddedStore;
pub use entry::CacheEntry;
pub use filesystem::FilesystemStore;
pub use memory::MemoryTier;
pub use relational::RelationalStore;
pub use repair::RepairOutcome;
pub use stats::CacheStats;
pub use store::{CacheStore, StoreOptions};
