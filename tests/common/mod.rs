//! Shared fixtures for the integration tests
//!
//! Every store is seeded with the same corpus, one item per tag use, so usage
//! counts add up exactly when tags are merged.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use tagwarden::{
    ExecutionMode, ExecutorOptions, MemoryTagStore, OpenStore, RecentItem, SqliteTagStore, Tag,
    TagStore,
};
use tempfile::TempDir;

/// `(name, usage)` pairs covering every category
pub const FIXTURE: &[(&str, u64)] = &[
    ("music", 34),
    ("Music", 96),
    ("ai", 2),
    ("ML", 3),
    ("Machine Learning", 8),
    ("a", 1),
    ("123", 5),
    ("Gardening", 1),
    ("Kubernetes", 40),
    ("Kubernets", 2),
    ("Rust", 12),
];

/// Tags left once the fixture plan has been applied
pub const CONSOLIDATED: &[(&str, u64)] = &[("AI", 13), ("Kubernetes", 42), ("Music", 130), ("Rust", 12)];

pub fn memory_store() -> MemoryTagStore {
    let store = MemoryTagStore::new();
    for (name, usage) in FIXTURE {
        store.seed_tag(name, *usage).unwrap();
    }
    store
}

/// A file-backed store in a fresh temp dir (kept alive by the returned guard)
pub fn sqlite_store() -> (SqliteTagStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = SqliteTagStore::open(dir.path().join("tags.db")).unwrap();
    let updated_at = Utc::now() - Duration::days(30);
    let mut n = 0;
    for (name, usage) in FIXTURE {
        for _ in 0..*usage {
            n += 1;
            store
                .upsert_item(&RecentItem {
                    item_id: format!("seed-{}", n).into(),
                    tag_names: vec![name.to_string()],
                    updated_at,
                })
                .unwrap();
        }
    }
    (store, dir)
}

pub fn options(mode: ExecutionMode) -> ExecutorOptions {
    ExecutorOptions::default().with_mode(mode).without_delays()
}

pub fn tag(store: &dyn TagStore, name: &str) -> Option<Tag> {
    store.list_tags().unwrap().into_iter().find(|t| t.name == name)
}

/// `(name, usage)` for every tag, sorted by name
pub fn snapshot(store: &dyn TagStore) -> Vec<(String, u64)> {
    let mut tags: Vec<(String, u64)> = store
        .list_tags()
        .unwrap()
        .into_iter()
        .map(|t| (t.name, t.usage_count))
        .collect();
    tags.sort();
    tags
}

pub fn expected(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
    let mut tags: Vec<(String, u64)> = pairs.iter().map(|(n, u)| (n.to_string(), *u)).collect();
    tags.sort();
    tags
}
