//! Clipboard history persistence
//!
//! SQLite-backed bounded history with a storage trait at the seam so the
//! retention policy stays independent of the engine.
//!
//! ## Module Structure
//! - `types`: ClipboardItem entity
//! - `store`: HistoryStore trait (the persistence contract)
//! - `database`: rusqlite implementation
//! - `retention`: dedup merge + count/age eviction policy

pub mod database;
mod retention;
mod store;
mod types;

// Re-export public API
pub use database::{compute_content_hash, default_db_path, SqliteStore};
pub use retention::RetentionManager;
pub use store::HistoryStore;
pub use types::ClipboardItem;
