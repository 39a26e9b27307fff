//! Items (bookmarks) that reference tags by name

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned item identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// An item touched within the live-normalization lookback window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentItem {
    pub item_id: ItemId,
    /// Tag names currently attached, in store order
    pub tag_names: Vec<String>,
    /// Last creation/modification time; imports without one count as fresh
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RecentItem {
    pub fn new(item_id: impl Into<ItemId>, tag_names: Vec<String>) -> Self {
        Self {
            item_id: item_id.into(),
            tag_names,
            updated_at: Utc::now(),
        }
    }
}
