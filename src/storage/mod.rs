//! Storage backends and persisted artifacts
//!
//! The engine talks to tag stores through the `TagStore` trait. Two backends
//! ship: `MemoryTagStore` for tests and experiments, and `SqliteTagStore` for
//! a persistent local store.

pub mod artifacts;
mod memory;
mod sqlite;
mod traits;

pub use artifacts::{BackupSnapshot, PlanDocument};
pub use memory::MemoryTagStore;
pub use sqlite::SqliteTagStore;
pub use traits::{OpenStore, StorageError, StorageResult, TagStore};
