use serde::{Deserialize, Serialize};

/// Default clipboard polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default foreground-application sampling interval in milliseconds
pub const DEFAULT_APP_SAMPLE_INTERVAL_MS: u64 = 500;

/// Default debounce window for near-simultaneous duplicate reads
pub const DEFAULT_DEBOUNCE_MS: i64 = 500;

/// Default self-write suppression window in milliseconds
pub const DEFAULT_SUPPRESSION_MS: i64 = 1000;

/// Default timeout for foreground-application queries
pub const DEFAULT_FOREGROUND_TIMEOUT_MS: u64 = 2000;

/// Default maximum number of unprotected items kept in history
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Default retention period for unprotected items
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Default maximum text length accepted into history (1 MB)
pub const DEFAULT_MAX_TEXT_LEN: usize = 1_000_000;

/// A user-defined detection rule merged into the classifier's rule order.
///
/// `pattern` is a regex applied to the whole clipboard content; a match
/// classifies the content as `kind` with the given confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    pub name: String,
    pub pattern: String,
    pub kind: String,
    #[serde(default = "default_rule_confidence")]
    pub confidence: u8,
}

fn default_rule_confidence() -> u8 {
    90
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Clipboard polling interval (milliseconds)
    #[serde(default = "default_poll_interval_ms", rename = "pollIntervalMs")]
    pub poll_interval_ms: u64,
    /// Foreground-application sampling interval (milliseconds)
    #[serde(default = "default_app_sample_interval_ms", rename = "appSampleIntervalMs")]
    pub app_sample_interval_ms: u64,
    /// Debounce window for duplicate clipboard reads (milliseconds)
    #[serde(default = "default_debounce_ms", rename = "debounceMs")]
    pub debounce_ms: i64,
    /// Self-write suppression window (milliseconds)
    #[serde(default = "default_suppression_ms", rename = "suppressionMs")]
    pub suppression_ms: i64,
    /// Timeout for foreground-application queries (milliseconds)
    #[serde(default = "default_foreground_timeout_ms", rename = "foregroundTimeoutMs")]
    pub foreground_timeout_ms: u64,
    /// Maximum number of unprotected items kept in history
    #[serde(default = "default_max_items", rename = "maxItems")]
    pub max_items: usize,
    /// Retention period for unprotected items (days)
    #[serde(default = "default_retention_days", rename = "retentionDays")]
    pub retention_days: u32,
    /// Maximum accepted text length in bytes
    #[serde(default = "default_max_text_len", rename = "maxTextLen")]
    pub max_text_len: usize,
    /// Whether user-defined detection rules are merged into the classifier
    #[serde(default, rename = "customRulesEnabled")]
    pub custom_rules_enabled: bool,
    /// User-defined detection rules, evaluated before the built-in set
    #[serde(default, rename = "customRules")]
    pub custom_rules: Vec<CustomRule>,
    /// Override for the history database path
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "dbPath")]
    pub db_path: Option<String>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_app_sample_interval_ms() -> u64 {
    DEFAULT_APP_SAMPLE_INTERVAL_MS
}
fn default_debounce_ms() -> i64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_suppression_ms() -> i64 {
    DEFAULT_SUPPRESSION_MS
}
fn default_foreground_timeout_ms() -> u64 {
    DEFAULT_FOREGROUND_TIMEOUT_MS
}
fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}
fn default_max_text_len() -> usize {
    DEFAULT_MAX_TEXT_LEN
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            app_sample_interval_ms: DEFAULT_APP_SAMPLE_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            suppression_ms: DEFAULT_SUPPRESSION_MS,
            foreground_timeout_ms: DEFAULT_FOREGROUND_TIMEOUT_MS,
            max_items: DEFAULT_MAX_ITEMS,
            retention_days: DEFAULT_RETENTION_DAYS,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            custom_rules_enabled: false,
            custom_rules: Vec::new(),
            db_path: None,
        }
    }
}
