//! clipstack daemon binary
//!
//! `clipstack watch` runs the capture pipeline: the foreground-application
//! tracker and the clipboard poller feed capture events into the retention
//! manager. The remaining subcommands are one-shot operations over the same
//! history store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use clipstack::capture::{
    spawn_monitor, ActiveAppTracker, ArboardClipboard, Classifier, EnhancedDetector,
    SystemClipboard, SystemForegroundQuery,
};
use clipstack::config::{self, Config};
use clipstack::error::ResultExt;
use clipstack::history::{
    default_db_path, ClipboardItem, HistoryStore, RetentionManager, SqliteStore,
};
use clipstack::logging;

#[derive(Parser)]
#[command(name = "clipstack", about = "Clipboard history daemon", version)]
struct Cli {
    /// Override the history database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the clipboard capture daemon (default)
    Watch,
    /// List recent history entries
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Search history by content substring
    Search { query: String },
    /// Pin an entry so it is never auto-evicted
    Pin { id: String },
    /// Unpin an entry
    Unpin { id: String },
    /// Delete an entry
    Delete { id: String },
    /// Delete the entire history
    Clear,
    /// Copy an entry's content back to the system clipboard
    Copy { id: String },
}

fn main() -> Result<()> {
    let _guard = logging::init();
    let cli = Cli::parse();

    let config = config::load_config();
    let db_path = cli
        .db
        .clone()
        .or_else(|| config.db_path.as_deref().map(PathBuf::from))
        .map(Ok)
        .unwrap_or_else(default_db_path)?;

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open history store at {:?}", db_path))?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(config, store),
        Command::List { limit } => list(&store, limit),
        Command::Search { query } => search(&store, &query),
        Command::Pin { id } => store.set_pinned(&id, true),
        Command::Unpin { id } => store.set_pinned(&id, false),
        Command::Delete { id } => store.delete(&id),
        Command::Clear => store.clear(),
        Command::Copy { id } => copy(&store, &id),
    }
}

/// Run the capture pipeline until the process is terminated.
fn watch(config: Config, store: SqliteStore) -> Result<()> {
    let retention = RetentionManager::new(Arc::new(store), config.max_items, config.retention_days);

    // One maintenance sweep before polling begins so a long-stopped daemon
    // doesn't resurface stale history
    retention.evict().warn_on_err();

    let tracker = ActiveAppTracker::new(
        Arc::new(SystemForegroundQuery),
        Duration::from_millis(config.app_sample_interval_ms),
        Duration::from_millis(config.foreground_timeout_ms),
    );
    let tracker_handle = tracker.start();

    let classifier = if config.custom_rules_enabled {
        Classifier::with_custom_rules(&config.custom_rules)
    } else {
        Classifier::new()
    };

    let (monitor, events) =
        spawn_monitor(tracker.clone(), EnhancedDetector::new(classifier), &config);

    info!(
        db_items = retention.store().count().unwrap_or(0),
        max_items = config.max_items,
        retention_days = config.retention_days,
        "clipstack watching clipboard"
    );

    // The poll loops run for the lifetime of the process; this loop only
    // ends if the monitor goes away
    for event in events {
        retention.ingest_logged(&event);
    }

    monitor.stop();
    tracker.stop();
    let _ = tracker_handle.join();
    let _ = monitor.thread.join();
    Ok(())
}

fn list(store: &SqliteStore, limit: usize) -> Result<()> {
    for item in store.list_all(Some(limit))? {
        print_item(&item);
    }
    Ok(())
}

fn search(store: &SqliteStore, query: &str) -> Result<()> {
    for item in store.search(query, 50)? {
        print_item(&item);
    }
    Ok(())
}

fn copy(store: &SqliteStore, id: &str) -> Result<()> {
    let item = store
        .get(id)?
        .with_context(|| format!("Item not found: {}", id))?;
    let mut clipboard = ArboardClipboard::new().context("Clipboard unavailable")?;
    clipboard.write_text(&item.content)?;
    info!(id = %item.id, "Copied entry to clipboard");
    Ok(())
}

fn print_item(item: &ClipboardItem) {
    let preview: String = item.content.chars().take(60).collect();
    let preview = preview.replace('\n', " ");
    let pin = if item.pinned { "*" } else { " " };
    println!(
        "{} {} [{:>8}] {:<12} {}",
        pin,
        item.id,
        item.kind.as_str(),
        item.source,
        preview
    );
}
