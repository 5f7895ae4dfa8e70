//! Retention policy
//!
//! Decides what a capture event does to the store: exact-content duplicates
//! are merged in place (timestamp bump, refreshed classification and source,
//! identity and pin/category state preserved), new content is inserted, and
//! every insert is followed by count- and age-based eviction passes that
//! never touch pinned or categorized items.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::store::HistoryStore;
use super::types::ClipboardItem;
use crate::capture::CaptureEvent;

/// Retention policy over an opaque history store.
#[derive(Clone)]
pub struct RetentionManager {
    store: Arc<dyn HistoryStore>,
    max_items: usize,
    retention_days: u32,
}

impl RetentionManager {
    pub fn new(store: Arc<dyn HistoryStore>, max_items: usize, retention_days: u32) -> Self {
        RetentionManager {
            store,
            max_items,
            retention_days,
        }
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Fold one capture event into the store.
    ///
    /// Returns the stored item. A storage failure means the event is not
    /// considered captured; the caller logs and moves on, retrying when the
    /// clipboard next genuinely changes.
    pub fn ingest(&self, event: &CaptureEvent) -> Result<ClipboardItem> {
        if let Some(existing) = self
            .store
            .find_by_content(&event.content)
            .context("Dedup lookup failed")?
        {
            // Merge: keep identity and protection state, bump recency,
            // refresh classification and attribution
            let merged = ClipboardItem {
                timestamp: event.timestamp,
                kind: event.kind,
                source: event.source.clone(),
                ..existing
            };
            self.store
                .update(&merged)
                .context("Duplicate refresh failed")?;
            debug!(id = %merged.id, "Recopied existing item, bumped timestamp");
            return Ok(merged);
        }

        let item = ClipboardItem::from_event(event);
        self.store.insert(&item).context("Insert failed")?;
        debug!(id = %item.id, kind = item.kind.as_str(), "Stored new clipboard item");

        self.evict().context("Eviction after insert failed")?;
        Ok(item)
    }

    /// Run both eviction passes. Protected items are never candidates.
    ///
    /// Count pass: while the total item count exceeds the limit, delete the
    /// oldest evictable items. Age pass: delete evictable items older than
    /// the retention cutoff regardless of count.
    pub fn evict(&self) -> Result<()> {
        let all = self.store.list_all(None).context("Eviction listing failed")?;

        // Oldest-first evictable candidates
        let mut evictable: Vec<&ClipboardItem> =
            all.iter().filter(|item| !item.is_protected()).collect();
        evictable.sort_by_key(|item| item.timestamp);

        let mut deleted = 0usize;
        let total = all.len();

        if total > self.max_items {
            let excess = total - self.max_items;
            for item in evictable.iter().take(excess) {
                self.store
                    .delete(&item.id)
                    .with_context(|| format!("Count eviction failed for {}", item.id))?;
                deleted += 1;
            }
            if excess > evictable.len() {
                // Only protected items remain over the limit; they stay
                debug!(
                    over_limit = excess - evictable.len(),
                    "History over limit but remaining items are protected"
                );
            }
        }

        let cutoff = chrono::Utc::now().timestamp_millis()
            - (self.retention_days as i64 * 24 * 60 * 60 * 1000);
        for item in evictable.iter().skip(deleted) {
            if item.timestamp < cutoff {
                self.store
                    .delete(&item.id)
                    .with_context(|| format!("Age eviction failed for {}", item.id))?;
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(deleted, retention_days = self.retention_days, "Evicted history items");
        }
        Ok(())
    }

    /// Ingest with failure logging, for use in the event loop. Returns
    /// whether the event made it into the store.
    pub fn ingest_logged(&self, event: &CaptureEvent) -> bool {
        match self.ingest(event) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Failed to ingest capture event (will retry on next change)");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ContentKind;
    use crate::history::database::SqliteStore;
    use std::collections::BTreeSet;

    fn event(content: &str, timestamp: i64) -> CaptureEvent {
        CaptureEvent {
            content: content.to_string(),
            timestamp,
            kind: ContentKind::Text,
            source: "Terminal".to_string(),
            confidence: 60,
            reasoning: vec![],
        }
    }

    fn manager(max_items: usize, retention_days: u32) -> RetentionManager {
        let store = SqliteStore::open_in_memory().expect("open");
        RetentionManager::new(Arc::new(store), max_items, retention_days)
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    #[test]
    fn test_new_content_is_inserted() {
        let manager = manager(100, 30);
        let item = manager.ingest(&event("hello", now_ms())).expect("ingest");
        assert_eq!(item.content, "hello");
        assert_eq!(manager.store().count().expect("count"), 1);
    }

    #[test]
    fn test_duplicate_content_never_coexists() {
        let manager = manager(100, 30);
        manager.ingest(&event("X", 1000)).expect("first");
        manager.ingest(&event("X", 2000)).expect("second");
        manager.ingest(&event("X", 3000)).expect("third");

        let all = manager.store().list_all(None).expect("list");
        assert_eq!(all.len(), 1, "at most one item per distinct content");
        assert_eq!(all[0].timestamp, 3000);
    }

    #[test]
    fn test_recency_bump_preserves_identity_and_protection() {
        let manager = manager(100, 30);
        let original = manager.ingest(&event("X", 1000)).expect("first");
        manager.store().set_pinned(&original.id, true).expect("pin");
        let mut cats = BTreeSet::new();
        cats.insert("work".to_string());
        manager.store().set_categories(&original.id, &cats).expect("categorize");

        let mut second = event("X", 2000);
        second.source = "Safari".to_string();
        second.kind = ContentKind::Code;
        let merged = manager.ingest(&second).expect("second");

        assert_eq!(merged.id, original.id);
        assert_eq!(merged.timestamp, 2000);
        assert_eq!(merged.source, "Safari");
        assert_eq!(merged.kind, ContentKind::Code);

        let stored = manager.store().get(&original.id).expect("get").expect("some");
        assert!(stored.pinned, "pin state must survive recopy");
        assert!(stored.categories.contains("work"));
    }

    #[test]
    fn test_count_eviction_deletes_exactly_the_excess() {
        let manager = manager(100, 36500);
        let base = now_ms();
        // 100 items fill the store; timestamps ascend so item 0 is oldest
        for i in 0..100 {
            manager.ingest(&event(&format!("item-{i}"), base + i)).expect("ingest");
        }
        assert_eq!(manager.store().count().expect("count"), 100);

        // The 101st triggers eviction of exactly one oldest evictable item
        manager.ingest(&event("item-100", base + 100)).expect("ingest");
        assert_eq!(manager.store().count().expect("count"), 100);
        assert!(manager
            .store()
            .find_by_content("item-0")
            .expect("find")
            .is_none());
        assert!(manager
            .store()
            .find_by_content("item-100")
            .expect("find")
            .is_some());
    }

    #[test]
    fn test_protected_items_survive_count_eviction() {
        let manager = manager(3, 36500);
        let base = now_ms();

        let oldest = manager.ingest(&event("keep-me", base)).expect("ingest");
        manager.store().set_pinned(&oldest.id, true).expect("pin");

        for i in 1..=4 {
            manager.ingest(&event(&format!("filler-{i}"), base + i)).expect("ingest");
        }

        // Limit 3, five ingested: the pinned oldest must still be there
        let all = manager.store().list_all(None).expect("list");
        assert_eq!(all.len(), 3);
        assert!(manager
            .store()
            .find_by_content("keep-me")
            .expect("find")
            .is_some());
    }

    #[test]
    fn test_age_eviction_removes_stale_items() {
        let manager = manager(100, 30);
        let stale = now_ms() - 40 * 24 * 60 * 60 * 1000;
        manager.ingest(&event("ancient", stale)).expect("ingest");
        manager.ingest(&event("fresh", now_ms())).expect("ingest");

        assert!(manager
            .store()
            .find_by_content("ancient")
            .expect("find")
            .is_none());
        assert!(manager
            .store()
            .find_by_content("fresh")
            .expect("find")
            .is_some());
    }

    #[test]
    fn test_protected_items_survive_age_eviction() {
        let manager = manager(100, 30);
        let stale = now_ms() - 40 * 24 * 60 * 60 * 1000;
        let old = manager.ingest(&event("old-but-pinned", stale)).expect("ingest");
        manager.store().set_pinned(&old.id, true).expect("pin");

        manager.ingest(&event("trigger", now_ms())).expect("ingest");
        assert!(manager
            .store()
            .find_by_content("old-but-pinned")
            .expect("find")
            .is_some());
    }

    #[test]
    fn test_duplicate_refresh_does_not_trigger_eviction() {
        let manager = manager(2, 30);
        let stale = now_ms() - 40 * 24 * 60 * 60 * 1000;
        manager.ingest(&event("ancient", stale)).expect("ingest");

        // An update (not insert) must not run eviction, so the stale item
        // survives a recopy of other content... but a recopy of the stale
        // content itself bumps it fresh.
        manager.ingest(&event("ancient", now_ms())).expect("recopy");
        assert!(manager
            .store()
            .find_by_content("ancient")
            .expect("find")
            .is_some());
    }

    #[test]
    fn test_all_items_protected_none_evicted() {
        let manager = manager(2, 36500);
        let base = now_ms();
        for i in 0..4 {
            let item = manager.ingest(&event(&format!("pin-{i}"), base + i)).expect("ingest");
            manager.store().set_pinned(&item.id, true).expect("pin");
        }
        assert_eq!(manager.store().count().expect("count"), 4);
    }

    /// Store stand-in whose writes always fail.
    struct FailingStore;

    impl crate::history::HistoryStore for FailingStore {
        fn find_by_content(&self, _content: &str) -> anyhow::Result<Option<ClipboardItem>> {
            Ok(None)
        }
        fn insert(&self, _item: &ClipboardItem) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        fn update(&self, _item: &ClipboardItem) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        fn delete(&self, _id: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        fn list_all(&self, _limit: Option<usize>) -> anyhow::Result<Vec<ClipboardItem>> {
            Ok(Vec::new())
        }
        fn count(&self) -> anyhow::Result<usize> {
            Ok(0)
        }
        fn get(&self, _id: &str) -> anyhow::Result<Option<ClipboardItem>> {
            Ok(None)
        }
        fn set_pinned(&self, _id: &str, _pinned: bool) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        fn set_categories(&self, _id: &str, _categories: &BTreeSet<String>) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        fn search(&self, _query: &str, _limit: usize) -> anyhow::Result<Vec<ClipboardItem>> {
            Ok(Vec::new())
        }
        fn clear(&self) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_storage_failure_propagates_from_ingest() {
        let manager = RetentionManager::new(Arc::new(FailingStore), 100, 30);
        assert!(manager.ingest(&event("x", now_ms())).is_err());
    }

    #[test]
    fn test_ingest_logged_swallows_storage_failure() {
        let manager = RetentionManager::new(Arc::new(FailingStore), 100, 30);
        assert!(!manager.ingest_logged(&event("x", now_ms())));
    }
}
