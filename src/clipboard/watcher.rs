//! Clipboard change polling
//!
//! A background thread samples the clipboard at a fixed interval and hands
//! each distinct, non-empty text to the change handler. The last surfaced
//! text is the only state kept between ticks.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::source::ClipboardSource;

/// One clipboard sample that was surfaced as a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

/// Callback invoked once per surfaced change.
pub type ChangeHandler = Arc<dyn Fn(ClipboardSnapshot) + Send + Sync>;

type SharedSource = Arc<Mutex<Box<dyn ClipboardSource>>>;

struct SamplingLoop {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Polls the clipboard and emits change events.
pub struct ClipboardWatcher {
    source: SharedSource,
    last_surfaced: Arc<Mutex<Option<String>>>,
    on_change: ChangeHandler,
    interval: Duration,
    sampling: Option<SamplingLoop>,
}

impl ClipboardWatcher {
    pub fn new(
        source: Box<dyn ClipboardSource>,
        interval: Duration,
        on_change: ChangeHandler,
    ) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            last_surfaced: Arc::new(Mutex::new(None)),
            on_change,
            interval,
            sampling: None,
        }
    }

    /// Record the current clipboard text as already surfaced, so text that was
    /// on the clipboard before launch does not fire a change.
    pub fn prime(&self) {
        let current = self.source.lock().read_text();
        *self.last_surfaced.lock() = current.filter(|text| !text.is_empty());
    }

    /// Start periodic sampling. A loop that is already running is stopped first.
    pub fn start(&mut self) {
        self.stop();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let source = Arc::clone(&self.source);
        let last_surfaced = Arc::clone(&self.last_surfaced);
        let on_change = Arc::clone(&self.on_change);
        let interval = self.interval;
        let loop_flag = Arc::clone(&stop_flag);

        let handle = thread::Builder::new()
            .name("clipboard-watcher".to_string())
            .spawn(move || {
                info!(
                    poll_interval_ms = interval.as_millis() as u64,
                    "Clipboard watcher started"
                );
                loop {
                    if loop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    sample(&source, &last_surfaced, &on_change);
                    thread::park_timeout(interval);
                }
                info!("Clipboard watcher stopped");
            });

        match handle {
            Ok(handle) => self.sampling = Some(SamplingLoop { stop_flag, handle }),
            Err(e) => warn!(error = %e, "Failed to spawn clipboard watcher thread"),
        }
    }

    /// Stop sampling. No-op when not running.
    pub fn stop(&mut self) {
        if let Some(sampling) = self.sampling.take() {
            sampling.stop_flag.store(true, Ordering::Relaxed);
            sampling.handle.thread().unpark();
            if sampling.handle.join().is_err() {
                warn!("Clipboard watcher thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.sampling.is_some()
    }

    /// Perform one sample on the calling thread.
    ///
    /// Returns the snapshot if it was surfaced (and the handler was called).
    pub fn tick(&self) -> Option<ClipboardSnapshot> {
        sample(&self.source, &self.last_surfaced, &self.on_change)
    }

    /// Current clipboard text without touching change-detection state.
    pub fn read_once(&self) -> Option<String> {
        self.source.lock().read_text().filter(|text| !text.is_empty())
    }

    pub fn last_surfaced(&self) -> Option<String> {
        self.last_surfaced.lock().clone()
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sample(
    source: &SharedSource,
    last_surfaced: &Mutex<Option<String>>,
    on_change: &ChangeHandler,
) -> Option<ClipboardSnapshot> {
    let text = source.lock().read_text()?;
    if text.is_empty() {
        return None;
    }

    {
        let mut last = last_surfaced.lock();
        if last.as_deref() == Some(text.as_str()) {
            return None;
        }
        *last = Some(text.clone());
    }

    let snapshot = ClipboardSnapshot {
        text,
        observed_at: Utc::now(),
    };
    debug!(len = snapshot.text.len(), "Clipboard change detected");
    on_change(snapshot.clone());
    Some(snapshot)
}
