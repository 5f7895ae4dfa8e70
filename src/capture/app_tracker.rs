//! Active application tracking
//!
//! Samples the OS for the frontmost application on a fixed interval and
//! keeps a small rolling history plus the last known non-self app. The
//! poller reads that value as the attribution fallback when content
//! heuristics are inconclusive.
//!
//! The tracker runs independently of the clipboard poller; a hung or
//! failing OS query resolves to a default label and never blocks the
//! next tick.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

use super::foreground::ForegroundQuery;

/// Label this process reports as; samples matching it are ignored
pub const OWN_PROCESS_LABEL: &str = "clipstack";

/// Label substituted when the OS query fails or times out
pub const DEFAULT_APP_LABEL: &str = "System";

/// Rolling history capacity (FIFO eviction)
const HISTORY_CAPACITY: usize = 10;

/// One foreground-application observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSample {
    pub label: String,
    /// Epoch milliseconds at sampling time
    pub timestamp: i64,
}

#[derive(Default)]
struct TrackerState {
    last_active_app: Option<String>,
    history: VecDeque<AppSample>,
}

/// Foreground-application sampler with a bounded rolling history.
///
/// Clone is cheap; clones share the same state and stop flag.
#[derive(Clone)]
pub struct ActiveAppTracker {
    state: Arc<RwLock<TrackerState>>,
    query: Arc<dyn ForegroundQuery>,
    sample_interval: Duration,
    query_timeout: Duration,
    stop_flag: Arc<AtomicBool>,
}

impl ActiveAppTracker {
    pub fn new(
        query: Arc<dyn ForegroundQuery>,
        sample_interval: Duration,
        query_timeout: Duration,
    ) -> Self {
        ActiveAppTracker {
            state: Arc::new(RwLock::new(TrackerState::default())),
            query,
            sample_interval,
            query_timeout,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take one sample: query the OS, substitute the default on failure,
    /// and fold the observation into tracker state. Own-process samples
    /// are dropped entirely so the tracked app keeps pointing at the app
    /// the user was actually working in.
    pub fn sample(&self) {
        let label = self
            .query
            .query(self.query_timeout)
            .unwrap_or_else(|| DEFAULT_APP_LABEL.to_string());

        if label.eq_ignore_ascii_case(OWN_PROCESS_LABEL) {
            debug!("Foreground app is ourselves, keeping previous attribution");
            return;
        }

        let sample = AppSample {
            label: label.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let mut state = self.state.write();
        state.last_active_app = Some(label);
        if state.history.len() == HISTORY_CAPACITY {
            state.history.pop_front();
        }
        state.history.push_back(sample);
    }

    /// Last known non-self application, if any has been observed yet.
    pub fn last_active_app(&self) -> Option<String> {
        self.state.read().last_active_app.clone()
    }

    /// Snapshot of the rolling history, oldest first.
    pub fn history(&self) -> Vec<AppSample> {
        self.state.read().history.iter().cloned().collect()
    }

    /// Start the background sampling thread.
    pub fn start(&self) -> JoinHandle<()> {
        let tracker = self.clone();
        info!(
            interval_ms = self.sample_interval.as_millis() as u64,
            "Active app tracker started"
        );
        thread::spawn(move || loop {
            if tracker.stop_flag.load(Ordering::Relaxed) {
                info!("Active app tracker stopping");
                break;
            }
            tracker.sample();
            thread::sleep(tracker.sample_interval);
        })
    }

    /// Signal the sampling thread to stop after its current tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}
