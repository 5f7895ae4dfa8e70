//! Clipboard capture pipeline
//!
//! Everything between the OS clipboard and the persisted history: polling
//! and change detection, content classification, source attribution, and
//! the foreground-application sampler that feeds attribution.
//!
//! ## Module Structure
//! - `patterns`: entropy and regex utilities (pure)
//! - `classifier`: ordered content-type rule list
//! - `platform`: content-fingerprint platform heuristic
//! - `foreground`: per-OS frontmost-application queries
//! - `app_tracker`: rolling foreground-application sampler
//! - `detector`: attribution fusion (heuristic + tracker + classifier)
//! - `clipboard`: system clipboard trait and arboard implementation
//! - `monitor`: the poll-tick state machine emitting capture events

mod app_tracker;
mod classifier;
mod clipboard;
mod detector;
mod foreground;
mod monitor;
mod patterns;
mod platform;

// Re-export public API
// These exports form the public API of the capture module.

// Classification
#[allow(unused_imports)]
pub use classifier::{Classification, Classifier, ContentKind, DetectionRule, FALLBACK_CONFIDENCE};

// Platform heuristic
#[allow(unused_imports)]
pub use platform::{detect_platform, Platform, PlatformGuess, UNKNOWN_CONFIDENCE};

// Pattern utilities
#[allow(unused_imports)]
pub use patterns::{char_classes, shannon_entropy};

// Foreground application tracking
#[allow(unused_imports)]
pub use app_tracker::{ActiveAppTracker, AppSample, DEFAULT_APP_LABEL, OWN_PROCESS_LABEL};
pub use foreground::{ForegroundQuery, SystemForegroundQuery};

// Attribution fusion
pub use detector::{Attribution, Detection, EnhancedDetector};

// Clipboard access
#[allow(unused_imports)]
pub use clipboard::{encode_rgba_as_data_uri, ArboardClipboard, SystemClipboard};

// Monitor
#[allow(unused_imports)]
pub use monitor::{
    self_copy, spawn_monitor, CaptureEvent, ClipboardMonitor, Fingerprint, MonitorHandle,
    SuppressionHandle,
};

// Test-only exports
#[cfg(test)]
#[allow(unused_imports)]
pub use clipboard::FakeClipboard;
#[cfg(test)]
#[allow(unused_imports)]
pub use foreground::FakeForegroundQuery;
