//! Persistent history types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::capture::{CaptureEvent, ContentKind};

/// One persisted clipboard history entry.
///
/// `content` is the deduplication key: the store never holds two items with
/// the same content string. Pinned or categorized items are protected from
/// automatic eviction and only removed by explicit user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardItem {
    pub id: String,
    /// Raw content; image items carry a PNG data URI
    pub content: String,
    pub kind: ContentKind,
    /// Epoch milliseconds; capture time, refreshed when the same content
    /// is copied again
    pub timestamp: i64,
    /// Attributed source application label
    pub source: String,
    pub pinned: bool,
    /// User-assigned labels; insertion order irrelevant
    pub categories: BTreeSet<String>,
}

impl ClipboardItem {
    /// Build a fresh item from a capture event, minting a new id.
    pub fn from_event(event: &CaptureEvent) -> Self {
        ClipboardItem {
            id: Uuid::new_v4().to_string(),
            content: event.content.clone(),
            kind: event.kind,
            timestamp: event.timestamp,
            source: event.source.clone(),
            pinned: false,
            categories: BTreeSet::new(),
        }
    }

    /// Protected items are exempt from count- and age-based eviction.
    pub fn is_protected(&self) -> bool {
        self.pinned || !self.categories.is_empty()
    }
}
