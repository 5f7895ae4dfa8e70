//! SQLite history store
//!
//! rusqlite-backed implementation of `HistoryStore`. Dedup lookups go
//! through a SHA-256 content hash index with an exact content comparison on
//! top, so hash collisions can never merge distinct items.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::store::HistoryStore;
use super::types::ClipboardItem;
use crate::capture::ContentKind;

/// Compute SHA-256 hash of content for fast dedup lookups
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Get the default database path (~/.clipstack/db/history.sqlite)
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = PathBuf::from(shellexpand::tilde("~/.clipstack").as_ref());
    let db_dir = data_dir.join("db");

    if !db_dir.exists() {
        std::fs::create_dir_all(&db_dir).context("Failed to create ~/.clipstack/db directory")?;
    }

    Ok(db_dir.join("history.sqlite"))
}

/// SQLite-backed history store. Clone shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // WAL for concurrent reads while the poller writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .context("Failed to enable WAL mode")?;

        // Avoid "database is locked" under contention between the ingest
        // path and UI-triggered mutations
        conn.execute_batch("PRAGMA busy_timeout = 5000;")
            .context("Failed to set busy_timeout")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                content_hash TEXT,
                kind TEXT NOT NULL DEFAULT 'text',
                timestamp INTEGER NOT NULL,
                source TEXT NOT NULL DEFAULT 'Unknown',
                pinned INTEGER DEFAULT 0,
                categories TEXT NOT NULL DEFAULT '[]'
            )",
            [],
        )
        .context("Failed to create history table")?;

        // Migration: add source column to databases created before
        // attribution landed
        let has_source_column: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('history') WHERE name='source'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false);

        if !has_source_column {
            conn.execute(
                "ALTER TABLE history ADD COLUMN source TEXT NOT NULL DEFAULT 'Unknown'",
                [],
            )
            .context("Failed to add source column")?;
            info!("Migrated history schema: added source column");
        }

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_timestamp ON history(timestamp DESC)",
            [],
        )
        .context("Failed to create timestamp index")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_dedup ON history(content_hash)",
            [],
        )
        .context("Failed to create dedup index")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pinned_timestamp ON history(pinned DESC, timestamp DESC)",
            [],
        )
        .context("Failed to create pinned+timestamp index")?;

        debug!("History database ready");

        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClipboardItem> {
    let kind: String = row.get(2)?;
    let categories_json: String = row.get(6)?;
    let categories: BTreeSet<String> =
        serde_json::from_str(&categories_json).unwrap_or_default();
    Ok(ClipboardItem {
        id: row.get(0)?,
        content: row.get(1)?,
        kind: ContentKind::from_str(&kind),
        timestamp: row.get(3)?,
        source: row.get(4)?,
        pinned: row.get::<_, i64>(5)? != 0,
        categories,
    })
}

const ITEM_COLUMNS: &str = "id, content, kind, timestamp, source, pinned, categories";

impl HistoryStore for SqliteStore {
    fn find_by_content(&self, content: &str) -> Result<Option<ClipboardItem>> {
        let conn = self.lock()?;
        let content_hash = compute_content_hash(content);

        // Hash narrows the scan; exact comparison decides
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM history WHERE content_hash = ?"
            ))
            .context("Failed to prepare dedup query")?;

        let items = stmt
            .query_map(params![&content_hash], row_to_item)
            .context("Failed to query by content hash")?;

        for item in items {
            let item = item.context("Failed to read history row")?;
            if item.content == content {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn insert(&self, item: &ClipboardItem) -> Result<()> {
        let conn = self.lock()?;
        let categories_json =
            serde_json::to_string(&item.categories).context("Failed to encode categories")?;
        conn.execute(
            "INSERT INTO history (id, content, content_hash, kind, timestamp, source, pinned, categories)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &item.id,
                &item.content,
                compute_content_hash(&item.content),
                item.kind.as_str(),
                item.timestamp,
                &item.source,
                item.pinned as i64,
                categories_json,
            ],
        )
        .context("Failed to insert clipboard item")?;

        debug!(id = %item.id, kind = item.kind.as_str(), "Inserted clipboard item");
        Ok(())
    }

    fn update(&self, item: &ClipboardItem) -> Result<()> {
        let conn = self.lock()?;
        let categories_json =
            serde_json::to_string(&item.categories).context("Failed to encode categories")?;
        let affected = conn
            .execute(
                "UPDATE history SET content = ?2, content_hash = ?3, kind = ?4, timestamp = ?5,
                 source = ?6, pinned = ?7, categories = ?8 WHERE id = ?1",
                params![
                    &item.id,
                    &item.content,
                    compute_content_hash(&item.content),
                    item.kind.as_str(),
                    item.timestamp,
                    &item.source,
                    item.pinned as i64,
                    categories_json,
                ],
            )
            .context("Failed to update clipboard item")?;

        if affected == 0 {
            anyhow::bail!("Item not found: {}", item.id);
        }
        debug!(id = %item.id, "Updated clipboard item");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM history WHERE id = ?", params![id])
            .context("Failed to delete clipboard item")?;

        if affected == 0 {
            anyhow::bail!("Item not found: {}", id);
        }
        debug!(id = %id, "Deleted clipboard item");
        Ok(())
    }

    fn list_all(&self, limit: Option<usize>) -> Result<Vec<ClipboardItem>> {
        let conn = self.lock()?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM history ORDER BY timestamp DESC LIMIT ?"
            ))
            .context("Failed to prepare list query")?;

        let items = stmt
            .query_map(params![limit], row_to_item)
            .context("Failed to list history")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read history rows")?;
        Ok(items)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
            .context("Failed to count history")?;
        Ok(count as usize)
    }

    fn get(&self, id: &str) -> Result<Option<ClipboardItem>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ITEM_COLUMNS} FROM history WHERE id = ?"))
            .context("Failed to prepare get query")?;
        let mut rows = stmt
            .query_map(params![id], row_to_item)
            .context("Failed to query item")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read history row")?)),
            None => Ok(None),
        }
    }

    fn set_pinned(&self, id: &str, pinned: bool) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE history SET pinned = ?2 WHERE id = ?1",
                params![id, pinned as i64],
            )
            .context("Failed to update pin state")?;

        if affected == 0 {
            anyhow::bail!("Item not found: {}", id);
        }
        info!(id = %id, pinned, "Pin state changed");
        Ok(())
    }

    fn set_categories(&self, id: &str, categories: &BTreeSet<String>) -> Result<()> {
        let conn = self.lock()?;
        let categories_json =
            serde_json::to_string(categories).context("Failed to encode categories")?;
        let affected = conn
            .execute(
                "UPDATE history SET categories = ?2 WHERE id = ?1",
                params![id, categories_json],
            )
            .context("Failed to update categories")?;

        if affected == 0 {
            anyhow::bail!("Item not found: {}", id);
        }
        info!(id = %id, count = categories.len(), "Categories changed");
        Ok(())
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ClipboardItem>> {
        let conn = self.lock()?;
        let pattern = format!(
            "%{}%",
            query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM history WHERE content LIKE ? ESCAPE '\\'
                 ORDER BY timestamp DESC LIMIT ?"
            ))
            .context("Failed to prepare search query")?;

        let items = stmt
            .query_map(params![pattern, limit as i64], row_to_item)
            .context("Failed to search history")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read search rows")?;
        Ok(items)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM history", [])
            .context("Failed to clear history")?;
        info!("Cleared all clipboard history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str, timestamp: i64) -> ClipboardItem {
        ClipboardItem {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            kind: ContentKind::Text,
            timestamp,
            source: "Terminal".to_string(),
            pinned: false,
            categories: BTreeSet::new(),
        }
    }

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(compute_content_hash("abc"), compute_content_hash("abc"));
        assert_ne!(compute_content_hash("abc"), compute_content_hash("abd"));
    }

    #[test]
    fn test_content_hash_format() {
        let hash = compute_content_hash("test");
        assert_eq!(hash.len(), 64, "SHA-256 hash should be 64 hex chars");
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_insert_and_find_by_content() {
        let store = SqliteStore::open_in_memory().expect("open");
        let original = item("hello", 1000);
        store.insert(&original).expect("insert");

        let found = store.find_by_content("hello").expect("find").expect("some");
        assert_eq!(found, original);
        assert!(store.find_by_content("other").expect("find").is_none());
    }

    #[test]
    fn test_update_round_trip() {
        let store = SqliteStore::open_in_memory().expect("open");
        let mut entry = item("hello", 1000);
        store.insert(&entry).expect("insert");

        entry.timestamp = 2000;
        entry.source = "Safari".to_string();
        entry.pinned = true;
        entry.categories.insert("work".to_string());
        store.update(&entry).expect("update");

        let found = store.get(&entry.id).expect("get").expect("some");
        assert_eq!(found, entry);
    }

    #[test]
    fn test_update_missing_item_errors() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert!(store.update(&item("ghost", 1)).is_err());
    }

    #[test]
    fn test_delete_removes_item() {
        let store = SqliteStore::open_in_memory().expect("open");
        let entry = item("hello", 1000);
        store.insert(&entry).expect("insert");
        store.delete(&entry.id).expect("delete");
        assert_eq!(store.count().expect("count"), 0);
        assert!(store.delete(&entry.id).is_err());
    }

    #[test]
    fn test_list_all_orders_by_recency() {
        let store = SqliteStore::open_in_memory().expect("open");
        store.insert(&item("oldest", 1000)).expect("insert");
        store.insert(&item("newest", 3000)).expect("insert");
        store.insert(&item("middle", 2000)).expect("insert");

        let all = store.list_all(None).expect("list");
        let contents: Vec<_> = all.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle", "oldest"]);

        let limited = store.list_all(Some(2)).expect("list");
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_pin_and_categories_updates() {
        let store = SqliteStore::open_in_memory().expect("open");
        let entry = item("hello", 1000);
        store.insert(&entry).expect("insert");

        store.set_pinned(&entry.id, true).expect("pin");
        let mut cats = BTreeSet::new();
        cats.insert("snippets".to_string());
        store.set_categories(&entry.id, &cats).expect("categorize");

        let found = store.get(&entry.id).expect("get").expect("some");
        assert!(found.pinned);
        assert!(found.categories.contains("snippets"));
        assert!(found.is_protected());
    }

    #[test]
    fn test_search_matches_substring() {
        let store = SqliteStore::open_in_memory().expect("open");
        store.insert(&item("the quick brown fox", 1000)).expect("insert");
        store.insert(&item("lazy dog", 2000)).expect("insert");

        let hits = store.search("quick", 10).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "the quick brown fox");
    }

    #[test]
    fn test_search_escapes_like_wildcards() {
        let store = SqliteStore::open_in_memory().expect("open");
        store.insert(&item("100% done", 1000)).expect("insert");
        store.insert(&item("100 percent", 2000)).expect("insert");

        let hits = store.search("100%", 10).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "100% done");
    }

    #[test]
    fn test_clear_empties_store() {
        let store = SqliteStore::open_in_memory().expect("open");
        store.insert(&item("a", 1)).expect("insert");
        store.insert(&item("b", 2)).expect("insert");
        store.clear().expect("clear");
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.sqlite");
        {
            let store = SqliteStore::open(&path).expect("open");
            store.insert(&item("persisted", 1000)).expect("insert");
        }
        let reopened = SqliteStore::open(&path).expect("reopen");
        assert_eq!(reopened.count().expect("count"), 1);
    }

    #[test]
    fn test_categories_survive_round_trip() {
        let store = SqliteStore::open_in_memory().expect("open");
        let mut entry = item("tagged", 1000);
        entry.categories.insert("a".to_string());
        entry.categories.insert("b".to_string());
        store.insert(&entry).expect("insert");

        let found = store.find_by_content("tagged").expect("find").expect("some");
        assert_eq!(found.categories, entry.categories);
    }
}
