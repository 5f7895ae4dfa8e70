//! History store contract
//!
//! The retention manager talks to persistence through this trait; any
//! key-value/document store with these operations works. The crate ships a
//! SQLite implementation in `database`.

use anyhow::Result;
use std::collections::BTreeSet;

use super::types::ClipboardItem;

/// Operations the capture pipeline and UI surface need from storage.
///
/// `list_all` returns items ordered by recency (newest first). Content
/// equality in `find_by_content` is exact string equality; that is the
/// deduplication contract.
pub trait HistoryStore: Send + Sync {
    fn find_by_content(&self, content: &str) -> Result<Option<ClipboardItem>>;
    fn insert(&self, item: &ClipboardItem) -> Result<()>;
    fn update(&self, item: &ClipboardItem) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
    fn list_all(&self, limit: Option<usize>) -> Result<Vec<ClipboardItem>>;
    fn count(&self) -> Result<usize>;

    fn get(&self, id: &str) -> Result<Option<ClipboardItem>>;
    fn set_pinned(&self, id: &str, pinned: bool) -> Result<()>;
    fn set_categories(&self, id: &str, categories: &BTreeSet<String>) -> Result<()>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ClipboardItem>>;
    fn clear(&self) -> Result<()>;
}
