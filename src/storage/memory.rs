//! In-process tag store
//!
//! Holds tags, items and associations behind a single mutex. Usage counts are
//! derived from the associations, as a real bookmark service does. Faults can
//! be queued per operation to exercise retry and abort paths.

use super::traits::{StorageError, StorageResult, TagStore};
use crate::tag::{ItemId, RecentItem, Tag, TagId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct ItemRecord {
    tags: Vec<TagId>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    tags: BTreeMap<TagId, String>,
    items: BTreeMap<ItemId, ItemRecord>,
    next_id: i64,
    next_item: u64,
    faults: HashMap<&'static str, VecDeque<StorageError>>,
    mutations: usize,
}

impl Inner {
    fn take_fault(&mut self, op: &'static str) -> StorageResult<()> {
        match self.faults.get_mut(op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn id_by_name(&self, name: &str) -> Option<TagId> {
        self.tags
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id.clone())
    }

    fn get_or_create(&mut self, name: &str) -> StorageResult<TagId> {
        if name.trim().is_empty() {
            return Err(StorageError::Conflict("empty tag name".to_string()));
        }
        if let Some(id) = self.id_by_name(name) {
            return Ok(id);
        }
        self.next_id += 1;
        let id = TagId::from(self.next_id);
        self.tags.insert(id.clone(), name.to_string());
        Ok(id)
    }

    fn usage(&self, id: &TagId) -> u64 {
        self.items.values().filter(|item| item.tags.contains(id)).count() as u64
    }

    fn snapshot(&self, id: &TagId) -> Option<Tag> {
        self.tags
            .get(id)
            .map(|name| Tag::new(id.clone(), name.clone(), self.usage(id)))
    }

    fn names(&self, record: &ItemRecord) -> Vec<String> {
        record
            .tags
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect()
    }
}

/// Tag store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    inner: Mutex<Inner>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Seeding ===

    /// Insert or overwrite an item with the given tag names.
    pub fn upsert_item(&self, item: &RecentItem) -> StorageResult<()> {
        let mut inner = self.lock();
        let mut tags: Vec<TagId> = Vec::new();
        for name in &item.tag_names {
            let id = inner.get_or_create(name)?;
            if !tags.contains(&id) {
                tags.push(id);
            }
        }
        inner.items.insert(
            item.item_id.clone(),
            ItemRecord {
                tags,
                updated_at: item.updated_at,
            },
        );
        Ok(())
    }

    /// Add an item updated at `updated_at`.
    pub fn add_item(
        &self,
        id: impl Into<ItemId>,
        names: &[&str],
        updated_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.upsert_item(&RecentItem {
            item_id: id.into(),
            tag_names: names.iter().map(|n| n.to_string()).collect(),
            updated_at,
        })
    }

    /// Create `usage` anonymous items that carry `name`, returning the tag id.
    ///
    /// The items are dated well outside any lookback window.
    pub fn seed_tag(&self, name: &str, usage: u64) -> StorageResult<TagId> {
        let mut inner = self.lock();
        let id = inner.get_or_create(name)?;
        let updated_at = Utc::now() - chrono::Duration::days(30);
        for _ in 0..usage {
            inner.next_item += 1;
            let item_id = ItemId::from(format!("seed-{}", inner.next_item));
            inner.items.insert(
                item_id,
                ItemRecord {
                    tags: vec![id.clone()],
                    updated_at,
                },
            );
        }
        Ok(id)
    }

    // === Inspection ===

    /// Current tag names on an item, in order
    pub fn item_tags(&self, id: &ItemId) -> Option<Vec<String>> {
        let inner = self.lock();
        inner.items.get(id).map(|record| inner.names(record))
    }

    /// Current tag with exactly this name
    pub fn tag_by_name(&self, name: &str) -> Option<Tag> {
        let inner = self.lock();
        inner.id_by_name(name).and_then(|id| inner.snapshot(&id))
    }

    /// Number of successful mutating calls so far
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }

    // === Fault injection ===

    /// Make the next call to `op` (a `TagStore` method name) fail with `err`.
    /// Multiple faults for one operation are returned in order.
    pub fn inject_fault(&self, op: &'static str, err: StorageError) {
        self.lock().faults.entry(op).or_default().push_back(err);
    }
}

impl TagStore for MemoryTagStore {
    fn list_tags(&self) -> StorageResult<Vec<Tag>> {
        let mut inner = self.lock();
        inner.take_fault("list_tags")?;
        Ok(inner
            .tags
            .keys()
            .filter_map(|id| inner.snapshot(id))
            .collect())
    }

    fn get_tag(&self, id: &TagId) -> StorageResult<Option<Tag>> {
        let mut inner = self.lock();
        inner.take_fault("get_tag")?;
        Ok(inner.snapshot(id))
    }

    fn list_recent_items(&self, window: chrono::Duration) -> StorageResult<Vec<RecentItem>> {
        let mut inner = self.lock();
        inner.take_fault("list_recent_items")?;
        let cutoff = Utc::now() - window;
        Ok(inner
            .items
            .iter()
            .filter(|(_, record)| record.updated_at >= cutoff)
            .map(|(id, record)| RecentItem {
                item_id: id.clone(),
                tag_names: inner.names(record),
                updated_at: record.updated_at,
            })
            .collect())
    }

    fn list_items_with_tag(&self, id: &TagId) -> StorageResult<Vec<ItemId>> {
        let mut inner = self.lock();
        inner.take_fault("list_items_with_tag")?;
        Ok(inner
            .items
            .iter()
            .filter(|(_, record)| record.tags.contains(id))
            .map(|(item_id, _)| item_id.clone())
            .collect())
    }

    fn rename_tag(&self, id: &TagId, new_name: &str) -> StorageResult<()> {
        let mut inner = self.lock();
        inner.take_fault("rename_tag")?;
        if !inner.tags.contains_key(id) {
            return Err(StorageError::NotFound(format!("tag {}", id)));
        }
        if let Some(other) = inner.id_by_name(new_name) {
            if &other != id {
                return Err(StorageError::Conflict(format!(
                    "name '{}' already belongs to tag {}",
                    new_name, other
                )));
            }
        }
        inner.tags.insert(id.clone(), new_name.to_string());
        inner.mutations += 1;
        Ok(())
    }

    fn reassign_item_tag(&self, item: &ItemId, old_name: &str, new_name: &str) -> StorageResult<()> {
        let mut inner = self.lock();
        inner.take_fault("reassign_item_tag")?;
        if !inner.items.contains_key(item) {
            return Err(StorageError::NotFound(format!("item {}", item)));
        }
        let Some(old_id) = inner.id_by_name(old_name) else {
            return Ok(());
        };
        let Some(pos) = inner
            .items
            .get(item)
            .and_then(|record| record.tags.iter().position(|t| *t == old_id))
        else {
            return Ok(());
        };
        let new_id = inner.get_or_create(new_name)?;
        if new_id == old_id {
            return Ok(());
        }

        let Some(record) = inner.items.get_mut(item) else {
            return Err(StorageError::NotFound(format!("item {}", item)));
        };
        if record.tags.contains(&new_id) {
            record.tags.remove(pos);
        } else {
            record.tags[pos] = new_id;
        }
        inner.mutations += 1;
        Ok(())
    }

    fn replace_item_tags(&self, item: &ItemId, names: &[String]) -> StorageResult<()> {
        let mut inner = self.lock();
        inner.take_fault("replace_item_tags")?;
        if !inner.items.contains_key(item) {
            return Err(StorageError::NotFound(format!("item {}", item)));
        }
        let mut tags: Vec<TagId> = Vec::new();
        for name in names {
            let id = inner.get_or_create(name)?;
            if !tags.contains(&id) {
                tags.push(id);
            }
        }
        if let Some(record) = inner.items.get_mut(item) {
            record.tags = tags;
        }
        inner.mutations += 1;
        Ok(())
    }

    fn delete_tag(&self, id: &TagId) -> StorageResult<()> {
        let mut inner = self.lock();
        inner.take_fault("delete_tag")?;
        if inner.tags.remove(id).is_none() {
            return Err(StorageError::NotFound(format!("tag {}", id)));
        }
        for record in inner.items.values_mut() {
            record.tags.retain(|t| t != id);
        }
        inner.mutations += 1;
        Ok(())
    }

    fn create_or_get_tag(&self, name: &str) -> StorageResult<TagId> {
        let mut inner = self.lock();
        inner.take_fault("create_or_get_tag")?;
        let known = inner.id_by_name(name).is_some();
        let id = inner.get_or_create(name)?;
        if !known {
            inner.mutations += 1;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryTagStore {
        let store = MemoryTagStore::new();
        let now = Utc::now();
        store.add_item("b1", &["music", "Jazz"], now).unwrap();
        store.add_item("b2", &["Music"], now).unwrap();
        store.add_item("b3", &["music", "Music"], now).unwrap();
        store
    }

    #[test]
    fn usage_is_derived_from_items() {
        let store = store();
        assert_eq!(store.tag_by_name("music").unwrap().usage_count, 2);
        assert_eq!(store.tag_by_name("Music").unwrap().usage_count, 2);
        assert_eq!(store.list_tags().unwrap().len(), 3);
    }

    #[test]
    fn reassign_deduplicates_existing_target() {
        let store = store();
        store.reassign_item_tag(&"b3".into(), "music", "Music").unwrap();
        assert_eq!(store.item_tags(&"b3".into()).unwrap(), vec!["Music"]);

        store.reassign_item_tag(&"b1".into(), "music", "Music").unwrap();
        assert_eq!(store.item_tags(&"b1".into()).unwrap(), vec!["Music", "Jazz"]);
    }

    #[test]
    fn reassign_without_old_tag_is_noop() {
        let store = store();
        let before = store.mutation_count();
        store.reassign_item_tag(&"b2".into(), "music", "Music").unwrap();
        assert_eq!(store.mutation_count(), before);
        assert!(matches!(
            store.reassign_item_tag(&"nope".into(), "music", "Music"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn reassign_onto_same_name_keeps_association() {
        let store = store();
        let before = store.mutation_count();
        store.reassign_item_tag(&"b1".into(), "music", "music").unwrap();
        assert_eq!(store.item_tags(&"b1".into()).unwrap(), vec!["music", "Jazz"]);
        assert_eq!(store.tag_by_name("music").unwrap().usage_count, 2);
        assert_eq!(store.mutation_count(), before);
    }

    #[test]
    fn rename_onto_existing_name_conflicts() {
        let store = store();
        let id = store.tag_by_name("music").unwrap().id;
        assert!(matches!(store.rename_tag(&id, "Music"), Err(StorageError::Conflict(_))));
        store.rename_tag(&id, "music").unwrap();
        assert!(matches!(
            store.rename_tag(&"999".into(), "x"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn delete_strips_tag_from_items() {
        let store = store();
        let id = store.tag_by_name("Jazz").unwrap().id;
        store.delete_tag(&id).unwrap();
        assert_eq!(store.item_tags(&"b1".into()).unwrap(), vec!["music"]);
        assert!(matches!(store.delete_tag(&id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn recent_items_respect_window() {
        let store = MemoryTagStore::new();
        store.add_item("old", &["x"], Utc::now() - chrono::Duration::hours(2)).unwrap();
        store.add_item("new", &["y"], Utc::now()).unwrap();
        let recent = store.list_recent_items(chrono::Duration::minutes(15)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].item_id.as_str(), "new");
    }

    #[test]
    fn injected_faults_fire_once_in_order() {
        let store = store();
        store.inject_fault("list_tags", StorageError::Transient("timeout".into()));
        store.inject_fault("list_tags", StorageError::Auth("401".into()));
        assert!(store.list_tags().unwrap_err().is_transient());
        assert!(store.list_tags().unwrap_err().is_auth());
        assert!(store.list_tags().is_ok());
    }

    #[test]
    fn seed_tag_creates_usage() {
        let store = MemoryTagStore::new();
        let id = store.seed_tag("Music", 96).unwrap();
        assert_eq!(store.get_tag(&id).unwrap().unwrap().usage_count, 96);
        assert!(store.list_recent_items(chrono::Duration::minutes(15)).unwrap().is_empty());
    }
}
