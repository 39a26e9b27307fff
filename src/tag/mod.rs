//! Tag and item records as seen by the engine
//!
//! These are point-in-time snapshots of what the tag store holds. The engine
//! never mutates them in place; every run re-reads the store.

mod item;

pub use item::{ItemId, RecentItem};

use serde::{Deserialize, Serialize};

/// Store-assigned tag identifier
///
/// Serializes as a plain string so that numeric and UUID ids from different
/// stores round-trip through plans and backups unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Create a TagId from any string-like identifier
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for TagId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// A tag in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Identity; stable across renames
    pub id: TagId,
    /// Display name (mutable in the store)
    pub name: String,
    /// Number of items referencing this tag when the snapshot was taken
    pub usage_count: u64,
}

impl Tag {
    pub fn new(id: impl Into<TagId>, name: impl Into<String>, usage_count: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage_count,
        }
    }

    /// Normalized (trimmed, lower-cased) form of the name
    pub fn normalized(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Normalize a tag name for comparison: trim surrounding whitespace and lowercase.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_name("  Machine Learning "), "machine learning");
        assert_eq!(normalize_name("API"), "api");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn tag_id_serializes_as_plain_string() {
        let id = TagId::from(42_i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");

        let back: TagId = serde_json::from_str("\"tag-7\"").unwrap();
        assert_eq!(back.as_str(), "tag-7");
    }

    #[test]
    fn tag_roundtrips_through_json() {
        let tag = Tag::new("1", "Music", 96);
        let json = serde_json::to_string(&tag).unwrap();
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
        assert_eq!(back.normalized(), "music");
    }
}
