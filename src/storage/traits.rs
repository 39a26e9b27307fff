//! Storage trait definitions

use crate::tag::{ItemId, RecentItem, Tag, TagId};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Store rejected credentials: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    Format(String),
}

impl StorageError {
    /// Errors worth one retry: timeouts, dropped connections, a busy database.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Credential failures end the run; nothing after them can succeed.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for tag store backends
///
/// The store owns tags, items and their associations; the engine only reads
/// snapshots and issues the mutations below. Implementations must be
/// thread-safe (Send + Sync).
pub trait TagStore: Send + Sync {
    // === Reads ===

    /// All tags with their current usage counts
    fn list_tags(&self) -> StorageResult<Vec<Tag>>;

    /// Current state of one tag, `None` if it no longer exists
    fn get_tag(&self, id: &TagId) -> StorageResult<Option<Tag>>;

    /// Items updated within `window` of now, with their tag names
    fn list_recent_items(&self, window: chrono::Duration) -> StorageResult<Vec<RecentItem>>;

    /// Items currently carrying a tag
    fn list_items_with_tag(&self, id: &TagId) -> StorageResult<Vec<ItemId>>;

    // === Mutations ===

    /// Rename a tag in place. `NotFound` if the id is gone, `Conflict` if
    /// another tag already has the name.
    fn rename_tag(&self, id: &TagId, new_name: &str) -> StorageResult<()>;

    /// Replace `old_name` with `new_name` on one item. If the item already
    /// carries `new_name` the old association is simply dropped; if it carries
    /// neither, nothing changes. `NotFound` if the item is gone.
    fn reassign_item_tag(&self, item: &ItemId, old_name: &str, new_name: &str) -> StorageResult<()>;

    /// Overwrite an item's tag set, creating tags as needed.
    fn replace_item_tags(&self, item: &ItemId, names: &[String]) -> StorageResult<()>;

    /// Delete a tag and strip it from every item. `NotFound` if the id is gone.
    fn delete_tag(&self, id: &TagId) -> StorageResult<()>;

    /// Id of the tag named exactly `name`, creating it if needed.
    fn create_or_get_tag(&self, name: &str) -> StorageResult<TagId>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: TagStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StorageError::Transient("timeout".into()).is_transient());
        assert!(!StorageError::NotFound("tag 1".into()).is_transient());
        assert!(!StorageError::Auth("401".into()).is_transient());

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(StorageError::from(busy).is_transient());
    }

    #[test]
    fn auth_is_fatal_marker() {
        assert!(StorageError::Auth("token revoked".into()).is_auth());
        assert!(!StorageError::Conflict("name taken".into()).is_auth());
    }
}
