//! SQLite storage backend for tagwarden

use super::traits::{OpenStore, StorageError, StorageResult, TagStore};
use crate::tag::{ItemId, RecentItem, Tag, TagId};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite-backed tag store
///
/// Uses a single SQLite database file with tables for tags, items, and the
/// ordered item/tag associations. Usage counts are computed from the
/// association table on read. Thread-safe via internal mutex on the
/// connection.
pub struct SqliteTagStore {
    conn: Mutex<Connection>,
}

impl SqliteTagStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Tags; names are unique and case-sensitive
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            -- Items (bookmarks)
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL
            );

            -- Item/tag associations, ordered per item
            CREATE TABLE IF NOT EXISTS item_tags (
                item_id TEXT NOT NULL,
                tag_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (item_id, tag_id),
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);
            CREATE INDEX IF NOT EXISTS idx_items_updated ON items(updated_at);

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ids are integers in this backend; anything else cannot exist.
    fn row_id(id: &TagId) -> Option<i64> {
        id.as_str().parse().ok()
    }

    fn format_time(ts: &DateTime<Utc>) -> String {
        // fixed width so that text comparison orders by time
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_time(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| StorageError::Format(format!("bad timestamp '{}': {}", raw, e)))
    }

    fn tag_id_by_name(conn: &Connection, name: &str) -> StorageResult<Option<i64>> {
        Ok(conn
            .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?)
    }

    fn get_or_create(tx: &Transaction<'_>, name: &str) -> StorageResult<i64> {
        if name.trim().is_empty() {
            return Err(StorageError::Conflict("empty tag name".to_string()));
        }
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
        let id = tx.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))?;
        Ok(id)
    }

    fn item_exists(conn: &Connection, item: &ItemId) -> StorageResult<bool> {
        Ok(conn
            .query_row("SELECT 1 FROM items WHERE id = ?1", params![item.as_str()], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn write_item_tags(tx: &Transaction<'_>, item: &ItemId, names: &[String]) -> StorageResult<()> {
        tx.execute("DELETE FROM item_tags WHERE item_id = ?1", params![item.as_str()])?;
        for (position, name) in names.iter().enumerate() {
            let tag_id = Self::get_or_create(tx, name)?;
            tx.execute(
                "INSERT OR IGNORE INTO item_tags (item_id, tag_id, position) VALUES (?1, ?2, ?3)",
                params![item.as_str(), tag_id, position as i64],
            )?;
        }
        Ok(())
    }

    /// Insert or overwrite an item with its tag names (seeding and import).
    pub fn upsert_item(&self, item: &RecentItem) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO items (id, updated_at) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at",
            params![item.item_id.as_str(), Self::format_time(&item.updated_at)],
        )?;
        Self::write_item_tags(&tx, &item.item_id, &item.tag_names)?;
        tx.commit()?;
        Ok(())
    }

    /// Current tag names on an item, in order
    pub fn item_tags(&self, item: &ItemId) -> StorageResult<Option<Vec<String>>> {
        let conn = self.lock();
        if !Self::item_exists(&conn, item)? {
            return Ok(None);
        }
        let mut stmt = conn.prepare(
            "SELECT t.name FROM item_tags it JOIN tags t ON t.id = it.tag_id
             WHERE it.item_id = ?1 ORDER BY it.position",
        )?;
        let names = stmt
            .query_map(params![item.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(names))
    }
}

impl OpenStore for SqliteTagStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TagStore for SqliteTagStore {
    // === Reads ===

    fn list_tags(&self) -> StorageResult<Vec<Tag>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, COUNT(it.item_id)
             FROM tags t LEFT JOIN item_tags it ON it.tag_id = t.id
             GROUP BY t.id ORDER BY t.id",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag::new(
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn get_tag(&self, id: &TagId) -> StorageResult<Option<Tag>> {
        let Some(row_id) = Self::row_id(id) else {
            return Ok(None);
        };
        let conn = self.lock();
        let tag = conn
            .query_row(
                "SELECT t.name, (SELECT COUNT(*) FROM item_tags WHERE tag_id = t.id)
                 FROM tags t WHERE t.id = ?1",
                params![row_id],
                |row| {
                    Ok(Tag::new(
                        row_id,
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)? as u64,
                    ))
                },
            )
            .optional()?;
        Ok(tag)
    }

    fn list_recent_items(&self, window: chrono::Duration) -> StorageResult<Vec<RecentItem>> {
        let cutoff = Self::format_time(&(Utc::now() - window));
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT i.id, i.updated_at, t.name
             FROM items i
             LEFT JOIN item_tags it ON it.item_id = i.id
             LEFT JOIN tags t ON t.id = it.tag_id
             WHERE i.updated_at >= ?1
             ORDER BY i.id, it.position",
        )?;
        let rows = stmt.query_map(params![cutoff], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut items: Vec<RecentItem> = Vec::new();
        for row in rows {
            let (item_id, updated_at, name) = row?;
            let same_item = items.last().map_or(false, |last| last.item_id.as_str() == item_id);
            if !same_item {
                items.push(RecentItem {
                    item_id: ItemId::from(item_id),
                    tag_names: Vec::new(),
                    updated_at: Self::parse_time(&updated_at)?,
                });
            }
            if let (Some(name), Some(current)) = (name, items.last_mut()) {
                current.tag_names.push(name);
            }
        }
        Ok(items)
    }

    fn list_items_with_tag(&self, id: &TagId) -> StorageResult<Vec<ItemId>> {
        let Some(row_id) = Self::row_id(id) else {
            return Ok(Vec::new());
        };
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT item_id FROM item_tags WHERE tag_id = ?1 ORDER BY item_id")?;
        let ids = stmt
            .query_map(params![row_id], |row| row.get::<_, String>(0))?
            .map(|r| r.map(ItemId::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // === Mutations ===

    fn rename_tag(&self, id: &TagId, new_name: &str) -> StorageResult<()> {
        let not_found = || StorageError::NotFound(format!("tag {}", id));
        let row_id = Self::row_id(id).ok_or_else(not_found)?;
        let conn = self.lock();

        if let Some(other) = Self::tag_id_by_name(&conn, new_name)? {
            if other != row_id {
                return Err(StorageError::Conflict(format!(
                    "name '{}' already belongs to tag {}",
                    new_name, other
                )));
            }
        }
        let rows = conn.execute(
            "UPDATE tags SET name = ?1 WHERE id = ?2",
            params![new_name, row_id],
        )?;
        if rows == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    fn reassign_item_tag(&self, item: &ItemId, old_name: &str, new_name: &str) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        if !Self::item_exists(&tx, item)? {
            return Err(StorageError::NotFound(format!("item {}", item)));
        }
        let Some(old_id) = Self::tag_id_by_name(&tx, old_name)? else {
            return Ok(());
        };
        let carries_old = tx
            .query_row(
                "SELECT 1 FROM item_tags WHERE item_id = ?1 AND tag_id = ?2",
                params![item.as_str(), old_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !carries_old {
            return Ok(());
        }

        let new_id = Self::get_or_create(&tx, new_name)?;
        if new_id != old_id {
            // Moves the association unless the item already carries the target
            tx.execute(
                "UPDATE OR IGNORE item_tags SET tag_id = ?3 WHERE item_id = ?1 AND tag_id = ?2",
                params![item.as_str(), old_id, new_id],
            )?;
            tx.execute(
                "DELETE FROM item_tags WHERE item_id = ?1 AND tag_id = ?2",
                params![item.as_str(), old_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_item_tags(&self, item: &ItemId, names: &[String]) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        if !Self::item_exists(&tx, item)? {
            return Err(StorageError::NotFound(format!("item {}", item)));
        }
        Self::write_item_tags(&tx, item, names)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_tag(&self, id: &TagId) -> StorageResult<()> {
        let row_id = Self::row_id(id).ok_or_else(|| StorageError::NotFound(format!("tag {}", id)))?;
        let conn = self.lock();
        // item_tags rows go with it (ON DELETE CASCADE)
        let rows = conn.execute("DELETE FROM tags WHERE id = ?1", params![row_id])?;
        if rows == 0 {
            return Err(StorageError::NotFound(format!("tag {}", id)));
        }
        Ok(())
    }

    fn create_or_get_tag(&self, name: &str) -> StorageResult<TagId> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let id = Self::get_or_create(&tx, name)?;
        tx.commit()?;
        Ok(TagId::from(id))
    }
}
