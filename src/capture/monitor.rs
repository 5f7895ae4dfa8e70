//! Clipboard polling and change detection
//!
//! The poller reads the clipboard on a fixed interval, decides whether the
//! content is a genuine new copy (vs. noise, duplicates, or our own writes),
//! and emits a capture event for each genuine change. Three gates run in
//! order of cost: a byte-identity fast path, a compact fingerprint debounce,
//! and the self-write suppression window.
//!
//! A failed OS read abandons the tick with state unchanged; the next tick
//! retries from scratch. No event is ever emitted twice for the same
//! clipboard state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::app_tracker::ActiveAppTracker;
use super::classifier::ContentKind;
use super::clipboard::SystemClipboard;
use super::detector::EnhancedDetector;
use crate::config::Config;

/// Characters of prefix and suffix folded into the change fingerprint
const FINGERPRINT_AFFIX_LEN: usize = 32;

/// Compact change-detection fingerprint: length plus fixed-size prefix and
/// suffix of the trimmed content. Not a cryptographic hash; collisions on
/// long near-duplicates are accepted, and the trimmed-equality check backs
/// it up before anything is actually debounced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    len: usize,
    prefix: String,
    suffix: String,
}

impl Fingerprint {
    pub fn of(content: &str) -> Self {
        let trimmed = content.trim();
        let chars: Vec<char> = trimmed.chars().collect();
        let prefix: String = chars.iter().take(FINGERPRINT_AFFIX_LEN).collect();
        let suffix: String = chars
            .iter()
            .skip(chars.len().saturating_sub(FINGERPRINT_AFFIX_LEN))
            .collect();
        Fingerprint {
            len: chars.len(),
            prefix,
            suffix,
        }
    }
}

/// The pipeline's sole output contract: one genuine clipboard change.
#[derive(Debug, Clone)]
pub struct CaptureEvent {
    pub content: String,
    /// Epoch milliseconds at capture time
    pub timestamp: i64,
    pub kind: ContentKind,
    pub source: String,
    /// Attribution confidence, 0-100
    pub confidence: u8,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone)]
struct ArmedSuppression {
    content: String,
    armed_at: i64,
}

/// Handle for arming the self-write suppression window. Cloneable and
/// shared with the UI side: arm it right before writing to the clipboard
/// so the poller absorbs the write instead of re-capturing it. Re-arming
/// before expiry simply extends the window.
#[derive(Clone)]
pub struct SuppressionHandle {
    armed: Arc<parking_lot::Mutex<Option<ArmedSuppression>>>,
}

impl SuppressionHandle {
    fn new() -> Self {
        SuppressionHandle {
            armed: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Arm (or re-arm) suppression for `content`.
    pub fn arm(&self, content: &str) {
        let mut armed = self.armed.lock();
        *armed = Some(ArmedSuppression {
            content: content.to_string(),
            armed_at: chrono::Utc::now().timestamp_millis(),
        });
        debug!(content_len = content.len(), "Self-write suppression armed");
    }

    /// Consume the suppression if it covers `content` and hasn't expired.
    fn absorb(&self, content: &str, now: i64, window_ms: i64) -> bool {
        let mut armed = self.armed.lock();
        match armed.as_ref() {
            Some(supp) if now - supp.armed_at <= window_ms && supp.content == content => {
                *armed = None;
                true
            }
            Some(supp) if now - supp.armed_at > window_ms => {
                *armed = None;
                false
            }
            _ => false,
        }
    }
}

/// Write text to the clipboard as ourselves, arming suppression first so
/// the poller doesn't bounce the write back into history.
pub fn self_copy(
    clipboard: &mut dyn SystemClipboard,
    suppression: &SuppressionHandle,
    text: &str,
) -> anyhow::Result<()> {
    suppression.arm(text);
    clipboard.write_text(text)
}

#[derive(Default)]
struct PollState {
    last_seen: Option<String>,
    last_fingerprint: Option<Fingerprint>,
    last_processed: Option<String>,
    last_processed_at: i64,
}

/// Interval-driven clipboard poller.
///
/// Construct with [`ClipboardMonitor::new`] and drive ticks manually via
/// [`tick`](Self::tick), or use [`spawn_monitor`] to run the loop on a
/// background thread with the real OS clipboard.
pub struct ClipboardMonitor {
    clipboard: Box<dyn SystemClipboard>,
    tracker: ActiveAppTracker,
    detector: EnhancedDetector,
    events: Sender<CaptureEvent>,
    suppression: SuppressionHandle,
    state: PollState,
    poll_interval: Duration,
    debounce_ms: i64,
    suppression_ms: i64,
    max_text_len: usize,
    stop_flag: Arc<AtomicBool>,
}

impl ClipboardMonitor {
    pub fn new(
        clipboard: Box<dyn SystemClipboard>,
        tracker: ActiveAppTracker,
        detector: EnhancedDetector,
        config: &Config,
    ) -> (Self, Receiver<CaptureEvent>) {
        let (tx, rx) = channel();
        let monitor = Self::with_parts(
            clipboard,
            tracker,
            detector,
            config,
            tx,
            SuppressionHandle::new(),
            Arc::new(AtomicBool::new(false)),
        );
        (monitor, rx)
    }

    fn with_parts(
        clipboard: Box<dyn SystemClipboard>,
        tracker: ActiveAppTracker,
        detector: EnhancedDetector,
        config: &Config,
        events: Sender<CaptureEvent>,
        suppression: SuppressionHandle,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        ClipboardMonitor {
            clipboard,
            tracker,
            detector,
            events,
            suppression,
            state: PollState::default(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            debounce_ms: config.debounce_ms,
            suppression_ms: config.suppression_ms,
            max_text_len: config.max_text_len,
            stop_flag,
        }
    }

    /// Handle for arming self-write suppression from other threads.
    pub fn suppression_handle(&self) -> SuppressionHandle {
        self.suppression.clone()
    }

    /// Flag that stops the background loop after its current tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// One poll tick. Reads the clipboard, applies the change gates in
    /// order, and emits at most one capture event.
    pub fn tick(&mut self) {
        // 1. Read text; fall back to image detection when the clipboard
        //    holds no text. Empty content never reaches the classifier.
        let content = match self.clipboard.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => match self.clipboard.read_image() {
                Ok(Some(data_uri)) => data_uri,
                Ok(None) => return,
                Err(e) => {
                    debug!(error = %e, "Clipboard image read failed, abandoning tick");
                    return;
                }
            },
            Err(e) => {
                debug!(error = %e, "Clipboard read failed, abandoning tick");
                return;
            }
        };

        // 2. Byte-identity fast path
        if self.state.last_seen.as_deref() == Some(content.as_str()) {
            return;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let fingerprint = Fingerprint::of(&content);

        // 3. Fingerprint debounce: near-simultaneous duplicate reads from
        //    the OS (whitespace variants of the same copy) within the window
        if self.state.last_fingerprint.as_ref() == Some(&fingerprint)
            && self
                .state
                .last_processed
                .as_deref()
                .map(|p| p.trim() == content.trim())
                .unwrap_or(false)
            && now - self.state.last_processed_at < self.debounce_ms
        {
            debug!("Debounced duplicate clipboard read");
            self.state.last_seen = Some(content);
            return;
        }

        // 4. Self-write suppression: our own copy action confirming
        if self.suppression.absorb(&content, now, self.suppression_ms) {
            debug!("Absorbed self-write, no capture event");
            self.remember(content, fingerprint, now);
            return;
        }

        // Oversized text is absorbed without capture so it isn't re-examined
        // every tick
        if content.len() > self.max_text_len {
            warn!(
                content_len = content.len(),
                max_len = self.max_text_len,
                "Skipping oversized clipboard content"
            );
            self.remember(content, fingerprint, now);
            return;
        }

        // 5. Genuine change: attribute, classify, emit
        let os_app = self.tracker.last_active_app();
        let detection = self.detector.detect(&content, os_app.as_deref());

        let event = CaptureEvent {
            content: content.clone(),
            timestamp: now,
            kind: detection.classification.kind,
            source: detection.attribution.source_app,
            confidence: detection.attribution.confidence,
            reasoning: detection.attribution.reasoning,
        };

        debug!(
            kind = event.kind.as_str(),
            source = %event.source,
            content_len = content.len(),
            "Clipboard change captured"
        );

        if self.events.send(event).is_err() {
            warn!("Capture event receiver dropped, stopping monitor");
            self.stop_flag.store(true, Ordering::Relaxed);
        }

        // 6. Remember what we processed
        self.remember(content, fingerprint, now);
    }

    fn remember(&mut self, content: String, fingerprint: Fingerprint, now: i64) {
        self.state.last_seen = Some(content.clone());
        self.state.last_fingerprint = Some(fingerprint);
        self.state.last_processed = Some(content);
        self.state.last_processed_at = now;
    }

    /// Run the polling loop on the current thread until stopped.
    pub fn run(mut self) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Clipboard monitor started"
        );
        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Clipboard monitor stopping");
                break;
            }
            self.tick();
            thread::sleep(self.poll_interval);
        }
    }
}

/// Everything the rest of the process needs to talk to a spawned monitor.
pub struct MonitorHandle {
    pub thread: JoinHandle<()>,
    pub suppression: SuppressionHandle,
    stop_flag: Arc<AtomicBool>,
}

impl MonitorHandle {
    /// Stop the polling loop after its current tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

/// Spawn the monitor on a background thread.
///
/// The OS clipboard handle is constructed inside the thread; platform
/// clipboard objects are tied to the thread that created them. If the
/// clipboard cannot be opened the thread exits immediately and the event
/// channel closes.
pub fn spawn_monitor(
    tracker: ActiveAppTracker,
    detector: EnhancedDetector,
    config: &Config,
) -> (MonitorHandle, Receiver<CaptureEvent>) {
    let (tx, rx) = channel();
    let suppression = SuppressionHandle::new();
    let stop_flag = Arc::new(AtomicBool::new(false));

    let thread_suppression = suppression.clone();
    let thread_stop = stop_flag.clone();
    let thread_config = config.clone();
    let thread = thread::spawn(move || {
        let clipboard = match super::clipboard::ArboardClipboard::new() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                warn!(error = %e, "Clipboard unavailable, monitor not starting");
                return;
            }
        };
        let monitor = ClipboardMonitor::with_parts(
            Box::new(clipboard),
            tracker,
            detector,
            &thread_config,
            tx,
            thread_suppression,
            thread_stop,
        );
        monitor.run();
    });

    (
        MonitorHandle {
            thread,
            suppression,
            stop_flag,
        },
        rx,
    )
}
